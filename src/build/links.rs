//! `[[post-name]]` cross references between posts.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CROSS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("cross reference pattern is valid"));

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-").expect("date prefix pattern is valid"));

/// Rewrite every `[[name]]` into a markdown link to `./posts/name.html`.
///
/// A leading `YYYY-MM-DD-` is dropped from both the target and the link text.
/// Anything that does not form a complete `[[...]]` pair is left alone.
pub fn rewrite_cross_refs(markdown: &str) -> String {
    CROSS_REF
        .replace_all(markdown, |caps: &Captures<'_>| {
            let name = DATE_PREFIX.replace(&caps[1], "");
            format!("[{name}](./posts/{name}.html)")
        })
        .into_owned()
}
