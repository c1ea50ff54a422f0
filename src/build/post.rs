//! Compiles one markdown post into a page of the site.

use std::path::{Path, PathBuf};

use super::document::{PostSource, PostSummary};
use super::index::post_tags;
use super::markdown::MarkdownRenderer;
use super::templates::{Fields, Templates, render};

#[derive(thiserror::Error, Debug)]
pub enum PostError {
    #[error("failed to read post {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

/// Everything needed to turn a post source into a page.
///
/// Immutable once built, so one instance is shared by every post.
pub struct PostCompiler {
    pub templates: Templates,
    pub markdown: MarkdownRenderer,
    /// Absolute base URL of the site, used for canonical post URLs
    pub site_url: String,
    /// `<output>/posts`
    pub output_dir: PathBuf,
}

impl PostCompiler {
    /// Render the full page for `post`.
    pub fn render_page(&self, post: &PostSource) -> String {
        let fm = &post.front_matter;
        let content = self.markdown.render(&post.body);
        let tags = post_tags(&fm.tags);
        let url = format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            post.url()
        );

        let fields: Fields<'_> = Fields::from([
            ("HEADER", self.templates.header.as_str()),
            ("NAV", self.templates.nav.as_str()),
            ("FOOTER", self.templates.footer.as_str()),
            ("TITLE", fm.title()),
            ("CATEGORY", fm.category()),
            ("DATE", fm.date()),
            ("READ_TIME", fm.read_time()),
            ("TAGS", tags.as_str()),
            ("CONTENT", content.as_str()),
            ("DESCRIPTION", fm.description()),
            ("URL", url.as_str()),
        ]);

        render(&self.templates.post, &fields)
    }

    /// Read, render and write one post, returning its summary.
    pub fn compile(&self, path: &Path) -> Result<PostSummary, PostError> {
        let post = PostSource::read(path).map_err(|e| PostError::Read(path.to_path_buf(), e))?;
        let html = self.render_page(&post);

        let output_path = self.output_dir.join(post.output_file_name());
        std::fs::write(&output_path, html).map_err(|e| PostError::Write(output_path.clone(), e))?;
        tracing::debug!("compiled {} -> {}", post.path.display(), output_path.display());

        Ok(post.summary())
    }
}

/// Markdown files directly inside `dir`, sorted by file name.
pub fn discover_posts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut posts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            posts.push(path);
        }
    }
    posts.sort();
    Ok(posts)
}
