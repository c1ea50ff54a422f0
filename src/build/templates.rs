//! Layout templates and placeholder substitution.
//!
//! Templates are plain HTML with `{{TOKEN}}` placeholders. Substitution is a
//! single pass over the template: inserted values are never rescanned and are
//! never escaped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("placeholder pattern is valid"));

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("required template {path} could not be read: {source}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Placeholder values, keyed by token name without braces (e.g. `TITLE`).
pub type Fields<'a> = HashMap<&'static str, &'a str>;

/// Replace every `{{NAME}}` in `template` whose `NAME` is present in `fields`.
///
/// Unknown placeholders are left untouched.
pub fn render(template: &str, fields: &Fields<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match fields.get(&caps[1]) {
            Some(value) => (*value).to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// The post layout and the partials spliced into it.
#[derive(Debug, Clone)]
pub struct Templates {
    pub post: String,
    pub header: String,
    pub footer: String,
    pub nav: String,
}

impl Templates {
    /// Load `layouts/post.html` and the `partials/` fragments from `dir`.
    ///
    /// Every fragment is required.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        Ok(Self {
            post: read_required(&dir.join("layouts/post.html"))?,
            header: read_required(&dir.join("partials/header.html"))?,
            footer: read_required(&dir.join("partials/footer.html"))?,
            nav: read_required(&dir.join("partials/nav.html"))?,
        })
    }
}

fn read_required(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::Missing {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_occurrence() {
        let fields = Fields::from([("TITLE", "Hello")]);
        let out = render("<title>{{TITLE}}</title><h1>{{TITLE}}</h1>", &fields);
        assert_eq!(out, "<title>Hello</title><h1>Hello</h1>");
    }

    #[test]
    fn test_render_is_not_recursive() {
        let fields = Fields::from([("HEADER", "<header>{{TITLE}}</header>"), ("TITLE", "Post")]);
        let out = render("{{HEADER}}<h1>{{TITLE}}</h1>", &fields);
        assert_eq!(out, "<header>{{TITLE}}</header><h1>Post</h1>");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let fields = Fields::from([("TITLE", "x")]);
        assert_eq!(render("{{AUTHOR}} {{TITLE}} {{ lower }}", &fields), "{{AUTHOR}} x {{ lower }}");
    }

    #[test]
    fn test_render_does_not_escape() {
        let fields = Fields::from([("CONTENT", "<p>a & b</p>")]);
        assert_eq!(render("{{CONTENT}}", &fields), "<p>a & b</p>");
    }

    #[test]
    fn test_render_inserts_dollar_signs_literally() {
        let fields = Fields::from([("CONTENT", "costs $1 and $2")]);
        assert_eq!(render("{{CONTENT}}", &fields), "costs $1 and $2");
    }

    #[test]
    fn test_load_requires_every_fragment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("layouts")).unwrap();
        std::fs::create_dir_all(dir.path().join("partials")).unwrap();
        std::fs::write(dir.path().join("layouts/post.html"), "{{CONTENT}}").unwrap();
        std::fs::write(dir.path().join("partials/header.html"), "<header>").unwrap();
        std::fs::write(dir.path().join("partials/footer.html"), "<footer>").unwrap();

        let err = Templates::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("nav.html"));

        std::fs::write(dir.path().join("partials/nav.html"), "<nav>").unwrap();
        let templates = Templates::load(dir.path()).unwrap();
        assert_eq!(templates.post, "{{CONTENT}}");
        assert_eq!(templates.nav, "<nav>");
    }
}
