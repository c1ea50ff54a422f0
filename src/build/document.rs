use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_READ_TIME: &str = "5 min";

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub category: Option<String>,
    /// Publication date as written (e.g. `2024-03-01`)
    #[serde(default, deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "scalar_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "readTime",
        alias = "read_time",
        deserialize_with = "scalar_string"
    )]
    pub read_time: Option<String>,
}

impl FrontMatter {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn date(&self) -> &str {
        self.date.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn read_time(&self) -> &str {
        self.read_time.as_deref().unwrap_or(DEFAULT_READ_TIME)
    }
}

/// Accept any YAML scalar (`2024`, `true`, `"text"`) as a string.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| yaml_scalar(&v)))
}

/// Accept a list of scalars, or a single scalar as a one-element list.
fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::Sequence(items)) => items.iter().filter_map(yaml_scalar).collect(),
        Some(other) => yaml_scalar(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` at the start of the file:
///
/// ```markdown
/// ---
/// title: My Post
/// date: 2024-03-01
/// tags: [rust, web]
/// ---
///
/// # Content starts here
/// ```
///
/// Invalid YAML is logged and replaced with empty front matter.
pub fn parse_front_matter(content: &str) -> ParsedContent {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    if !content.starts_with("---") {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    }

    let after_opening = &content[3..];
    let Some((yaml_content, markdown_content)) = split_at_closing_delimiter(after_opening) else {
        return ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        };
    };

    let yaml_content = yaml_content.trim_start_matches(['\r', '\n']);
    let markdown_content = markdown_content.to_string();

    let front_matter = if yaml_content.trim().is_empty() {
        FrontMatter::default()
    } else {
        match serde_yaml::from_str(yaml_content) {
            Ok(fm) => fm,
            Err(e) => {
                tracing::warn!("failed to parse front matter, using defaults: {e}");
                FrontMatter::default()
            }
        }
    };

    ParsedContent {
        front_matter,
        content: markdown_content,
    }
}

/// Split at the first line after the opening one that is exactly `---`.
///
/// Returns the text before that line and the text after it.
fn split_at_closing_delimiter(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == "---" {
            return Some((&text[..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

// =============================================================================
// Posts
// =============================================================================

/// A markdown post read from the posts directory.
#[derive(Debug, Clone)]
pub struct PostSource {
    /// File name without extension; also the output file stem
    pub slug: String,
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    /// Markdown body without the front matter block
    pub body: String,
}

impl PostSource {
    /// Read and split a post file.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed = parse_front_matter(&raw);
        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            slug,
            path: path.to_path_buf(),
            front_matter: parsed.front_matter,
            body: parsed.content,
        })
    }

    /// Output file name, e.g. `my-post.html`.
    pub fn output_file_name(&self) -> String {
        format!("{}.html", self.slug)
    }

    /// Site-relative URL of the compiled post, e.g. `posts/my-post.html`.
    pub fn url(&self) -> String {
        format!("posts/{}", self.output_file_name())
    }

    pub fn summary(&self) -> PostSummary {
        let fm = &self.front_matter;
        PostSummary {
            title: fm.title().to_string(),
            date: fm.date().to_string(),
            category: fm.category().to_string(),
            tags: fm.tags.clone(),
            description: fm.description().to_string(),
            read_time: fm.read_time().to_string(),
            url: self.url(),
        }
    }
}

/// Post metadata kept for the blog index.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub title: String,
    pub date: String,
    pub category: String,
    pub tags: Vec<String>,
    pub description: String,
    pub read_time: String,
    pub url: String,
}

impl PostSummary {
    /// The calendar date, if `date` is `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_front_matter_basic() {
        let content = r#"---
title: My Post
category: Rust
date: 2024-03-01
tags:
  - rust
  - cli
description: A test post
readTime: 8 min
---

# Hello World
"#;
        let parsed = parse_front_matter(content);
        let fm = &parsed.front_matter;
        assert_eq!(fm.title(), "My Post");
        assert_eq!(fm.category(), "Rust");
        assert_eq!(fm.date(), "2024-03-01");
        assert_eq!(fm.tags, vec!["rust", "cli"]);
        assert_eq!(fm.description(), "A test post");
        assert_eq!(fm.read_time(), "8 min");
        assert_eq!(parsed.content.trim(), "# Hello World");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed = parse_front_matter("---\ntitle: Only a title\n---\nBody");
        let fm = &parsed.front_matter;
        assert_eq!(fm.category(), "General");
        assert_eq!(fm.read_time(), "5 min");
        assert_eq!(fm.description(), "");
        assert_eq!(fm.date(), "");
        assert!(fm.tags.is_empty());
        assert_eq!(parsed.content, "Body");
    }

    #[test]
    fn test_read_time_alias_and_scalars() {
        let parsed = parse_front_matter("---\nread_time: 3 min\ntitle: 1984\ntags: solo\n---\n");
        let fm = &parsed.front_matter;
        assert_eq!(fm.read_time(), "3 min");
        assert_eq!(fm.title(), "1984");
        assert_eq!(fm.tags, vec!["solo"]);
    }

    #[test]
    fn test_parse_front_matter_no_front_matter() {
        let parsed = parse_front_matter("# Just Markdown\n\nNo front matter here.");
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert!(parsed.content.starts_with("# Just Markdown"));
    }

    #[test]
    fn test_parse_front_matter_empty_front_matter() {
        let parsed = parse_front_matter("---\n---\n\n# Content");
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.content.trim(), "# Content");
    }

    #[test]
    fn test_closing_delimiter_must_be_whole_line() {
        let content = "---\ntitle: Rule\n---- not yet\n---tail\n---  \nBody\n";
        let parsed = parse_front_matter(content);
        assert_eq!(parsed.content, "Body\n");

        let content = "---\ntitle: Rule\n----\nBody\n";
        let parsed = parse_front_matter(content);
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.content, content);
    }

    #[test]
    fn test_invalid_yaml_falls_back_to_defaults() {
        let parsed = parse_front_matter("---\ntitle: [broken\n---\nStill here");
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.content, "Still here");
    }

    #[test]
    fn test_post_source_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-01-01-hello.md");
        std::fs::write(&path, "---\ntitle: Hello\n---\nHi").unwrap();

        let post = PostSource::read(&path).unwrap();
        assert_eq!(post.slug, "2024-01-01-hello");
        assert_eq!(post.output_file_name(), "2024-01-01-hello.html");

        let summary = post.summary();
        assert_eq!(summary.url, "posts/2024-01-01-hello.html");
        assert_eq!(summary.category, "General");
        assert_eq!(summary.read_time, "5 min");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            parse_date("2024-03-01T10:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("someday"), None);
        assert_eq!(parse_date(""), None);
    }
}
