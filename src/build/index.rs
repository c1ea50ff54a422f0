//! Blog index cards.
//!
//! The index page carries two marker comments. Everything between them is
//! replaced with one card per post, newest first; the rest of the file is
//! left byte-for-byte as it was.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::document::PostSummary;

pub const START_MARKER: &str = "<!-- BLOG_POSTS_START -->";
pub const END_MARKER: &str = "<!-- BLOG_POSTS_END -->";

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("failed to read index page {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to write index page {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("index page {0} has no BLOG_POSTS_START ... BLOG_POSTS_END marker region")]
    MissingMarkers(PathBuf),
}

/// Sort newest first.
///
/// The sort is stable, so posts with the same date keep their input order.
/// Posts without a parseable date go last.
pub fn sort_newest_first(posts: &mut [PostSummary]) {
    posts.sort_by(|a, b| match (a.parsed_date(), b.parsed_date()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Human-readable date, e.g. "March 1, 2024". Unparseable dates are shown as written.
pub fn format_date(post: &PostSummary) -> String {
    match post.parsed_date() {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => post.date.clone(),
    }
}

fn tag_badges(tags: &[String], indent: &str) -> String {
    tags.iter()
        .map(|tag| format!("<span class=\"skill-tag\">{tag}</span>"))
        .collect::<Vec<_>>()
        .join(&format!("\n{indent}"))
}

/// Tag badges for the post layout.
pub fn post_tags(tags: &[String]) -> String {
    tag_badges(tags, &" ".repeat(24))
}

/// Render one summary card.
pub fn render_card(post: &PostSummary) -> String {
    format!(
        r#"
                <article class="blog-card glass-card">
                    <div class="blog-card-header">
                        <span class="blog-category">{category}</span>
                        <time class="blog-date" datetime="{date}">
                            <span class="material-icons-round">calendar_today</span>
                            {human_date}
                        </time>
                    </div>
                    <h2 class="blog-card-title">
                        <a href="{url}">{title}</a>
                    </h2>
                    <p class="blog-card-excerpt">{description}</p>
                    <div class="blog-card-footer">
                        <div class="blog-tags">
                            {tags}
                        </div>
                        <a href="{url}" class="read-more">
                            Read More
                            <span class="material-icons-round">arrow_forward</span>
                        </a>
                    </div>
                </article>"#,
        category = post.category,
        date = post.date,
        human_date = format_date(post),
        url = post.url,
        title = post.title,
        description = post.description,
        tags = tag_badges(&post.tags, &" ".repeat(28)),
    )
}

/// Render all cards, newest first.
pub fn render_cards(posts: &[PostSummary]) -> String {
    let mut posts = posts.to_vec();
    sort_newest_first(&mut posts);
    posts
        .iter()
        .map(render_card)
        .collect::<Vec<_>>()
        .join("\n            ")
}

/// Replace the marker region of `page` with `cards`.
///
/// The region runs from the first start marker to the last end marker.
/// Returns `None` when there is no such region.
pub fn splice_cards(page: &str, cards: &str) -> Option<String> {
    let start = page.find(START_MARKER)?;
    let end = page.rfind(END_MARKER)?;
    if end < start + START_MARKER.len() {
        return None;
    }

    let mut out = String::with_capacity(page.len() + cards.len());
    out.push_str(&page[..start]);
    out.push_str(START_MARKER);
    out.push_str("\n            ");
    out.push_str(cards);
    out.push_str("\n            ");
    out.push_str(END_MARKER);
    out.push_str(&page[end + END_MARKER.len()..]);
    Some(out)
}

/// Rewrite the index page at `path` with cards for `posts`.
pub fn update_index(path: &Path, posts: &[PostSummary]) -> Result<(), IndexError> {
    let page =
        std::fs::read_to_string(path).map_err(|e| IndexError::Read(path.to_path_buf(), e))?;

    let cards = render_cards(posts);
    let updated = splice_cards(&page, &cards)
        .ok_or_else(|| IndexError::MissingMarkers(path.to_path_buf()))?;

    std::fs::write(path, updated).map_err(|e| IndexError::Write(path.to_path_buf(), e))?;
    tracing::info!("updated {} with {} post(s)", path.display(), posts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str, date: &str) -> PostSummary {
        PostSummary {
            title: title.to_string(),
            date: date.to_string(),
            category: "General".to_string(),
            tags: vec!["rust".to_string(), "web".to_string()],
            description: format!("About {title}"),
            read_time: "5 min".to_string(),
            url: format!("posts/{}.html", title.to_lowercase()),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut posts = vec![
            summary("January", "2024-01-15"),
            summary("Undated", "soon"),
            summary("March", "2024-03-01"),
            summary("AlsoMarch", "2024-03-01"),
        ];
        sort_newest_first(&mut posts);
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["March", "AlsoMarch", "January", "Undated"]);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&summary("a", "2024-03-01")), "March 1, 2024");
        assert_eq!(format_date(&summary("a", "2023-12-25")), "December 25, 2023");
        assert_eq!(format_date(&summary("a", "not a date")), "not a date");
    }

    #[test]
    fn test_render_card() {
        let card = render_card(&summary("March", "2024-03-01"));
        assert!(card.contains("<span class=\"blog-category\">General</span>"));
        assert!(card.contains("datetime=\"2024-03-01\""));
        assert!(card.contains("March 1, 2024"));
        assert!(card.contains("<a href=\"posts/march.html\">March</a>"));
        assert!(card.contains("<p class=\"blog-card-excerpt\">About March</p>"));
        assert!(card.contains(
            "<span class=\"skill-tag\">rust</span>\n                            <span class=\"skill-tag\">web</span>"
        ));
        assert!(card.contains("class=\"read-more\""));
    }

    #[test]
    fn test_post_tags() {
        let tags = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            post_tags(&tags),
            "<span class=\"skill-tag\">a</span>\n                        <span class=\"skill-tag\">b</span>"
        );
        assert_eq!(post_tags(&[]), "");
    }

    #[test]
    fn test_cards_ordered_by_date() {
        let cards = render_cards(&[summary("January", "2024-01-15"), summary("March", "2024-03-01")]);
        let march = cards.find("posts/march.html").unwrap();
        let january = cards.find("posts/january.html").unwrap();
        assert!(march < january);
    }

    #[test]
    fn test_splice_preserves_outside_content() {
        let before = "<html>\n<body>\n    ";
        let after = "\n</body>\n</html>\n";
        let page = format!("{before}{START_MARKER}\n  old cards\n  {END_MARKER}{after}");

        let out = splice_cards(&page, "NEW").unwrap();
        assert!(out.starts_with(before));
        assert!(out.ends_with(after));
        assert_eq!(
            out,
            format!("{before}{START_MARKER}\n            NEW\n            {END_MARKER}{after}")
        );

        // Splicing again gives the same page
        assert_eq!(splice_cards(&out, "NEW").unwrap(), out);
    }

    #[test]
    fn test_splice_missing_markers() {
        assert!(splice_cards("<html></html>", "x").is_none());
        assert!(splice_cards(&format!("{START_MARKER} only"), "x").is_none());
        assert!(splice_cards(&format!("{END_MARKER} {START_MARKER}"), "x").is_none());
    }

    #[test]
    fn test_update_index_missing_markers_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.html");
        std::fs::write(&path, "<html></html>").unwrap();

        let err = update_index(&path, &[]).unwrap_err();
        assert!(matches!(err, IndexError::MissingMarkers(_)));
    }
}
