//! Configuration type definitions.
//!
//! This module contains all the data structures used in `folio.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// The full build configuration. Every section is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL used for canonical post URLs (no trailing slash needed)
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

// =============================================================================
// Source and output layout
// =============================================================================

/// Where sources are read from and where output goes.
///
/// Relative paths are resolved against the directory holding the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of markdown posts
    #[serde(default = "default_posts")]
    pub posts: PathBuf,
    /// Static asset tree, mirrored to `<output>/assets`
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Standalone HTML pages, copied to the output root
    #[serde(default = "default_pages")]
    pub pages: PathBuf,
    /// Directory holding `layouts/` and `partials/`
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// Single files copied to the output root (e.g. a favicon)
    #[serde(default = "default_extra_files")]
    pub extra_files: Vec<PathBuf>,
    /// Output directory, wiped on every build
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Listing page (relative to the output directory) that receives post cards
    #[serde(default = "default_index_page")]
    pub index_page: PathBuf,
}

fn default_posts() -> PathBuf {
    PathBuf::from("src/content/posts")
}

fn default_assets() -> PathBuf {
    PathBuf::from("src/assets")
}

fn default_pages() -> PathBuf {
    PathBuf::from("src/pages")
}

fn default_templates() -> PathBuf {
    PathBuf::from("src/templates")
}

fn default_extra_files() -> Vec<PathBuf> {
    vec![PathBuf::from("favicon.ico")]
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_index_page() -> PathBuf {
    PathBuf::from("blog.html")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts: default_posts(),
            assets: default_assets(),
            pages: default_pages(),
            templates: default_templates(),
            extra_files: default_extra_files(),
            output: default_output(),
            index_page: default_index_page(),
        }
    }
}

impl PathsConfig {
    /// Resolve every relative path against `base_path`.
    ///
    /// `index_page` stays relative: it names a file inside the output directory.
    pub fn resolve(&self, base_path: &std::path::Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_relative() {
                base_path.join(p)
            } else {
                p.clone()
            }
        };
        Self {
            posts: join(&self.posts),
            assets: join(&self.assets),
            pages: join(&self.pages),
            templates: join(&self.templates),
            extra_files: self.extra_files.iter().map(join).collect(),
            output: join(&self.output),
            index_page: self.index_page.clone(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
    /// Render single newlines inside a paragraph as `<br />`
    #[serde(default = "default_true")]
    pub breaks: bool,
    /// Expand `:name:` emoji shortcodes in prose
    #[serde(default = "default_true")]
    pub emoji: bool,
    /// Hide email autolinks behind numeric character references
    #[serde(default = "default_true")]
    pub mangle: bool,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            breaks: true,
            emoji: true,
            mangle: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_resolve_relative_paths() {
        let paths = PathsConfig::default().resolve(Path::new("/site"));
        assert_eq!(paths.posts, PathBuf::from("/site/src/content/posts"));
        assert_eq!(paths.output, PathBuf::from("/site/dist"));
        assert_eq!(paths.extra_files, vec![PathBuf::from("/site/favicon.ico")]);
        assert_eq!(paths.index_page, PathBuf::from("blog.html"));
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let paths = PathsConfig {
            output: PathBuf::from("/tmp/out"),
            ..PathsConfig::default()
        }
        .resolve(Path::new("/site"));
        assert_eq!(paths.output, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("site:\n  url: https://me.dev\n").unwrap();
        assert_eq!(config.site.url, "https://me.dev");
        assert_eq!(config.paths.output, PathBuf::from("dist"));
        assert!(config.markdown.breaks);
        assert!(config.markdown.mangle);
        assert!(config.markdown.extensions.contains(&"tables".to_string()));
    }
}
