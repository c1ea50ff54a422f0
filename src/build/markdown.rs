//! Markdown rendering for posts.
//!
//! Source text goes through three passes:
//! 1. `[[name]]` cross references become markdown links
//! 2. `$...$` / `$$...$$` math is rendered and left as slots
//! 3. pulldown-cmark renders the rest, with custom output for fenced code,
//!    headings, math slots, email autolinks and `> [!TAG]` callout blockquotes
//!
//! Passes 1 and 2 skip code blocks and inline code, wherever they are nested.

use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
    TextMergeStream, html,
};
use regex::{Captures, Regex};

use super::highlight::SyntaxHighlighter;
use super::links::rewrite_cross_refs;
use super::math::{MathEngine, MathMl, MathSlots};
use crate::config::MarkdownConfig;
use crate::util::capitalize;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static CALLOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^<p>\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION)\]").expect("callout pattern is valid")
});

static EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z0-9_]+):").expect("emoji pattern is valid"));

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Converts post bodies to HTML.
///
/// Built once per build from [`MarkdownConfig`] and shared by every post.
pub struct MarkdownRenderer {
    options: Options,
    breaks: bool,
    emoji: bool,
    mangle: bool,
    highlighter: SyntaxHighlighter,
    math: Box<dyn MathEngine>,
}

struct HeadingState<'a> {
    level: HeadingLevel,
    id: Option<String>,
    inner: Vec<Event<'a>>,
}

impl MarkdownRenderer {
    pub fn new(config: &MarkdownConfig) -> Result<Self, MarkdownError> {
        let mut options = Options::empty();
        for extension in &config.extensions {
            match extension.as_str() {
                "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.insert(Options::ENABLE_TABLES),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                other => return Err(MarkdownError::InvalidExtension(other.to_string())),
            }
        }

        Ok(Self {
            options,
            breaks: config.breaks,
            emoji: config.emoji,
            mangle: config.mangle,
            highlighter: SyntaxHighlighter,
            math: Box::new(MathMl),
        })
    }

    /// Replace the math backend.
    pub fn with_math_engine(self, engine: impl MathEngine + 'static) -> Self {
        self.with_boxed_math_engine(Box::new(engine))
    }

    pub fn with_boxed_math_engine(mut self, engine: Box<dyn MathEngine>) -> Self {
        self.math = engine;
        self
    }

    /// Render a post body to HTML.
    pub fn render(&self, markdown: &str) -> String {
        let mut math = MathSlots::default();
        let code = code_ranges(markdown, self.options);
        let markdown = map_outside_code(markdown, &code, |prose, at_line_start| {
            let prose = rewrite_cross_refs(prose);
            math.extract(&prose, at_line_start, self.math.as_ref())
        });

        let parser = TextMergeStream::new(Parser::new_ext(&markdown, self.options));
        let parser = mangle_email_links(parser, self.mangle);
        let events = fold_blockquotes(self.render_leaf_blocks(parser, &math));

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Replace code blocks and headings with raw HTML events and apply the
    /// inline tweaks (emoji, hard breaks) to everything else.
    fn render_leaf_blocks<'a>(
        &self,
        parser: impl Iterator<Item = Event<'a>>,
        math: &MathSlots,
    ) -> Vec<Event<'a>> {
        let mut events = Vec::new();

        let mut in_code_block = false;
        let mut code_language = String::new();
        let mut code_content = String::new();
        let mut heading: Option<HeadingState<'a>> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let html = self.render_code_block(&code_content, &code_language);
                    events.push(Event::Html(html.into()));
                }
                Event::Text(text) if in_code_block => code_content.push_str(&text),
                Event::Start(Tag::Heading { level, id, .. }) => {
                    heading = Some(HeadingState {
                        level,
                        id: id.map(|id| id.to_string()),
                        inner: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(state) = heading.take() {
                        events.push(Event::Html(render_heading(state).into()));
                    }
                }
                other => {
                    let other = self.inline_event(other, math);
                    match heading.as_mut() {
                        Some(state) => state.inner.push(other),
                        None => events.push(other),
                    }
                }
            }
        }

        events
    }

    fn inline_event<'a>(&self, event: Event<'a>, math: &MathSlots) -> Event<'a> {
        match event {
            Event::Text(text) => {
                let text = if self.emoji && text.contains(':') {
                    CowStr::from(replace_emoji(&text))
                } else {
                    text
                };
                if MathSlots::has_inline_slot(&text) {
                    Event::InlineHtml(math.fill_text(&text).into())
                } else {
                    Event::Text(text)
                }
            }
            Event::Html(html) if MathSlots::has_block_slot(&html) => {
                Event::Html(math.fill_html(&html).into())
            }
            Event::InlineHtml(html) if MathSlots::has_block_slot(&html) => {
                Event::InlineHtml(math.fill_html(&html).into())
            }
            Event::SoftBreak if self.breaks => Event::HardBreak,
            other => other,
        }
    }

    fn render_code_block(&self, code: &str, language: &str) -> String {
        let code = code.strip_suffix('\n').unwrap_or(code);
        let html = if language == "mermaid" {
            format!("<div class=\"mermaid-container\"><pre class=\"mermaid\">{code}</pre></div>")
        } else {
            self.highlighter.highlight(code, language)
        };
        html + "\n"
    }
}

fn render_heading(state: HeadingState<'_>) -> String {
    let mut inner = String::new();
    html::push_html(&mut inner, state.inner.into_iter());
    let id = state.id.unwrap_or_else(|| slugify(&inner));
    let level = state.level as usize;
    format!("<h{level} id=\"{id}\">{inner}</h{level}>\n")
}

/// Derive an anchor id from heading HTML.
///
/// The result only contains `[a-z0-9-]` and never starts or ends with `-`.
pub fn slugify(heading_html: &str) -> String {
    let text = HTML_TAG.replace_all(heading_html, "");
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug
}

// =============================================================================
// Callouts
// =============================================================================

/// Render each top-level blockquote to a single HTML event, turning
/// `[!TAG]` quotes into callouts. Nested quotes are handled first.
fn fold_blockquotes(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        if !matches!(event, Event::Start(Tag::BlockQuote(_))) {
            out.push(event);
            continue;
        }

        let mut depth = 1;
        let mut inner = Vec::new();
        for event in iter.by_ref() {
            match event {
                Event::Start(Tag::BlockQuote(_)) => depth += 1,
                Event::End(TagEnd::BlockQuote(_)) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            inner.push(event);
        }

        let mut body = String::new();
        html::push_html(&mut body, fold_blockquotes(inner).into_iter());
        out.push(Event::Html(render_blockquote(&body).into()));
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalloutKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl CalloutKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "NOTE" => Some(Self::Note),
            "TIP" => Some(Self::Tip),
            "IMPORTANT" => Some(Self::Important),
            "WARNING" => Some(Self::Warning),
            "CAUTION" => Some(Self::Caution),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "important",
            Self::Warning => "warning",
            Self::Caution => "caution",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Note => "📝",
            Self::Tip => "💡",
            Self::Important => "❗",
            Self::Warning => "⚠️",
            Self::Caution => "🚨",
        }
    }
}

/// Wrap rendered blockquote content, as a callout when it starts with a tag.
fn render_blockquote(body: &str) -> String {
    match split_callout(body) {
        Some((kind, title, content)) => {
            let title = if title.is_empty() {
                capitalize(kind.name())
            } else {
                title.to_string()
            };
            format!(
                "<div class=\"callout callout-{name}\"><div class=\"callout-title\"><span class=\"callout-icon\">{icon}</span><span class=\"callout-title-text\">{title}</span></div><div class=\"callout-content\">{content}</div></div>\n",
                name = kind.name(),
                icon = kind.icon(),
            )
        }
        None => format!("<blockquote>\n{body}</blockquote>\n"),
    }
}

/// Split `<p>[!TAG] title ...` into kind, title and the remaining content.
///
/// The title is the rest of the first line. When the first paragraph goes on
/// past that line, its remainder opens the content.
fn split_callout(body: &str) -> Option<(CalloutKind, &str, String)> {
    let caps = CALLOUT.captures(body)?;
    let kind = CalloutKind::parse(&caps[1])?;
    let rest = &body[caps.get(0)?.end()..];

    let para_end = rest.find("</p>")?;
    let (title, content) = match rest.find('\n') {
        Some(line_end) if line_end < para_end => (
            &rest[..line_end],
            format!("<p>{}", &rest[line_end + 1..]),
        ),
        _ => (
            &rest[..para_end],
            rest[para_end + "</p>".len()..]
                .trim_start_matches('\n')
                .to_string(),
        ),
    };

    let title = title.trim_end().trim_end_matches("<br />");
    if !title.is_empty() && !title.starts_with(char::is_whitespace) {
        return None;
    }

    Some((kind, title.trim(), content))
}

// =============================================================================
// Emoji and fences
// =============================================================================

fn emoji(name: &str) -> Option<&'static str> {
    Some(match name {
        "smile" => "😊",
        "heart" => "❤️",
        "rocket" => "🚀",
        "fire" => "🔥",
        "star" => "⭐",
        "check" => "✅",
        "cross" => "❌",
        "warning" => "⚠️",
        "bulb" => "💡",
        "book" => "📚",
        "computer" => "💻",
        "cloud" => "☁️",
        "lock" => "🔒",
        "key" => "🔑",
        "gear" => "⚙️",
        "chart" => "📊",
        "trophy" => "🏆",
        "thumbsup" => "👍",
        "thumbsdown" => "👎",
        "eyes" => "👀",
        "brain" => "🧠",
        "target" => "🎯",
        _ => return None,
    })
}

fn replace_emoji(text: &str) -> String {
    EMOJI
        .replace_all(text, |caps: &Captures<'_>| {
            emoji(&caps[1]).map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}

/// Byte ranges of every code block and inline code span in `markdown`.
fn code_ranges(markdown: &str, options: Options) -> Vec<Range<usize>> {
    Parser::new_ext(markdown, options)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// Apply `f` to every stretch of `markdown` outside the `code` ranges.
///
/// `f` also learns whether its stretch begins at the start of a line.
fn map_outside_code(
    markdown: &str,
    code: &[Range<usize>],
    mut f: impl FnMut(&str, bool) -> String,
) -> String {
    let at_line_start = |pos: usize| pos == 0 || markdown[..pos].ends_with('\n');

    let mut out = String::with_capacity(markdown.len());
    let mut pos = 0;
    for range in code {
        if range.start < pos {
            continue;
        }
        out.push_str(&f(&markdown[pos..range.start], at_line_start(pos)));
        out.push_str(&markdown[range.clone()]);
        pos = range.end;
    }
    out.push_str(&f(&markdown[pos..], at_line_start(pos)));
    out
}

// =============================================================================
// Email links
// =============================================================================

/// Spell every character as a numeric character reference.
fn mangle(text: &str) -> String {
    text.chars().map(|c| format!("&#{};", u32::from(c))).collect()
}

/// Rewrite `<user@example.com>` autolinks so the address only appears as
/// character references in the page source.
fn mangle_email_links<'a>(
    events: impl Iterator<Item = Event<'a>>,
    enabled: bool,
) -> impl Iterator<Item = Event<'a>> {
    let mut in_email = false;
    events.map(move |event| match event {
        Event::Start(Tag::Link {
            link_type: LinkType::Email,
            dest_url,
            ..
        }) if enabled => {
            in_email = true;
            Event::InlineHtml(format!("<a href=\"mailto:{}\">", mangle(&dest_url)).into())
        }
        Event::Text(text) if in_email => Event::InlineHtml(mangle(&text).into()),
        Event::End(TagEnd::Link) if in_email => {
            in_email = false;
            Event::InlineHtml("</a>".into())
        }
        other => other,
    })
}
