use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;

use super::assets::{AssetError, copy_dir, copy_files, copy_pages, empty_dir};
use super::document::PostSummary;
use super::index::{IndexError, update_index};
use super::markdown::{MarkdownError, MarkdownRenderer};
use super::math::MathEngine;
use super::post::{PostCompiler, PostError, discover_posts};
use super::templates::{TemplateError, Templates};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("post error: {0}")]
    Post(#[from] PostError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("failed to list posts in {0}: {1}")]
    Discover(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("post task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Summaries in file-name order
    pub posts: Vec<PostSummary>,
    pub assets: usize,
    pub pages: usize,
}

/// Directory that relative paths in the config file are resolved against.
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub struct Builder {
    config: Config,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    math: Option<Box<dyn MathEngine>>,
}

impl Builder {
    pub fn new(config: Config, base_path: PathBuf) -> Self {
        Self {
            config,
            base_path,
            math: None,
        }
    }

    /// Replace the default MathML engine.
    pub fn with_math_engine(mut self, engine: impl MathEngine + 'static) -> Self {
        self.math = Some(Box::new(engine));
        self
    }

    pub async fn build(self) -> Result<BuildResult, BuildError> {
        let paths = self.config.paths.resolve(&self.base_path);
        let output_dir = paths.output.clone();

        // Step 1: Reset the output directory
        empty_dir(&output_dir)?;
        info!("reset {}", output_dir.display());

        // Step 2: Mirror assets and extra files
        let assets = if paths.assets.is_dir() {
            copy_dir(&paths.assets, &output_dir.join("assets"))?
        } else {
            warn!("assets directory {} not found, skipping", paths.assets.display());
            0
        };
        let extra = copy_files(&paths.extra_files, &output_dir)?;
        info!("copied {assets} asset(s) and {extra} extra file(s)");

        // Step 3: Copy top-level pages
        let pages = copy_pages(&paths.pages, &output_dir)?;
        info!("copied {pages} page(s)");

        // Step 4: Load templates and the markdown renderer
        let templates = Templates::load(&paths.templates)?;
        let mut markdown = MarkdownRenderer::new(&self.config.markdown)?;
        if let Some(engine) = self.math {
            markdown = markdown.with_boxed_math_engine(engine);
        }
        info!("loaded templates from {}", paths.templates.display());

        // Step 5: Compile posts
        let posts_dir = output_dir.join("posts");
        std::fs::create_dir_all(&posts_dir)?;
        let compiler = Arc::new(PostCompiler {
            templates,
            markdown,
            site_url: self.config.site.url.clone(),
            output_dir: posts_dir,
        });
        let sources =
            discover_posts(&paths.posts).map_err(|e| BuildError::Discover(paths.posts.clone(), e))?;
        let posts = compile_all(compiler, sources).await?;
        info!("compiled {} post(s)", posts.len());

        // Step 6: Patch the index page with post cards
        update_index(&output_dir.join(&paths.index_page), &posts)?;

        Ok(BuildResult {
            output_dir,
            posts,
            assets,
            pages,
        })
    }
}

/// Compile every post on the blocking pool.
///
/// Summaries come back in the order of `sources`, whatever order the tasks finish in.
async fn compile_all(
    compiler: Arc<PostCompiler>,
    sources: Vec<PathBuf>,
) -> Result<Vec<PostSummary>, BuildError> {
    let mut tasks = JoinSet::new();
    for (index, path) in sources.into_iter().enumerate() {
        let compiler = Arc::clone(&compiler);
        tasks.spawn_blocking(move || compiler.compile(&path).map(|summary| (index, summary)));
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined??);
    }
    results.sort_by_key(|(index, _)| *index);

    Ok(results.into_iter().map(|(_, summary)| summary).collect())
}
