//! TeX math rendering.
//!
//! `$$...$$` spans are rendered in display mode, then `$...$` spans on a
//! single line are rendered inline. Each span is rendered on its own; a span
//! that fails to render is replaced by an inline error message.
//!
//! Rendered math never goes through the markdown parser. Each span is swapped
//! for a slot before parsing and the HTML is put back into the parser's
//! events: display math becomes a `<x-math data-slot="N" />` raw HTML tag,
//! inline math a pair of private-use characters around the slot number.

use std::sync::LazyLock;

use latex2mathml::{DisplayStyle, latex_to_mathml};
use regex::{Captures, Regex};

use crate::util::html_escape;

static DISPLAY_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("display math pattern is valid"));

static INLINE_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$\n]+?)\$").expect("inline math pattern is valid"));

static BLOCK_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<x-math data-slot="(\d+)" />"#).expect("block slot pattern is valid")
});

static INLINE_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("inline slot pattern is valid"));

const INLINE_OPEN: char = '\u{E000}';
const INLINE_CLOSE: char = '\u{E001}';

/// How an expression is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Inline,
    Display,
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct MathError(pub String);

/// Something that turns a TeX expression into HTML.
pub trait MathEngine: Send + Sync {
    fn render(&self, tex: &str, mode: RenderMode) -> Result<String, MathError>;
}

/// Renders TeX to MathML markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMl;

impl MathEngine for MathMl {
    fn render(&self, tex: &str, mode: RenderMode) -> Result<String, MathError> {
        let style = match mode {
            RenderMode::Inline => DisplayStyle::Inline,
            RenderMode::Display => DisplayStyle::Block,
        };
        latex_to_mathml(tex, style).map_err(|e| MathError(e.to_string()))
    }
}

/// Rendered math for one document, indexed by slot number.
#[derive(Debug, Default)]
pub struct MathSlots {
    rendered: Vec<String>,
}

impl MathSlots {
    /// Render every math span in `markdown` and leave a slot in its place.
    ///
    /// `at_line_start` tells whether `markdown` begins at the start of a line
    /// of the full document. A display span that starts a line is set apart
    /// by blank lines so it forms its own HTML block.
    pub fn extract(
        &mut self,
        markdown: &str,
        at_line_start: bool,
        engine: &dyn MathEngine,
    ) -> String {
        let markdown = DISPLAY_MATH.replace_all(markdown, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let starts_line = match start {
                0 => at_line_start,
                _ => markdown[..start].ends_with('\n'),
            };
            let slot = self.push(render_span(engine, &caps[1], RenderMode::Display));
            let tag = format!("<x-math data-slot=\"{slot}\" />");
            if starts_line {
                format!("\n\n{tag}\n\n")
            } else {
                tag
            }
        });
        INLINE_MATH
            .replace_all(&markdown, |caps: &Captures<'_>| {
                let slot = self.push(render_span(engine, &caps[1], RenderMode::Inline));
                format!("{INLINE_OPEN}{slot}{INLINE_CLOSE}")
            })
            .into_owned()
    }

    fn push(&mut self, html: String) -> usize {
        self.rendered.push(html);
        self.rendered.len() - 1
    }

    /// Whether `html` (a raw HTML event) holds a display slot.
    pub fn has_block_slot(html: &str) -> bool {
        html.contains("<x-math data-slot=")
    }

    /// Whether `text` (a text event) holds an inline slot.
    pub fn has_inline_slot(text: &str) -> bool {
        text.contains(INLINE_OPEN)
    }

    /// Replace display slots in raw HTML.
    pub fn fill_html(&self, html: &str) -> String {
        BLOCK_SLOT
            .replace_all(html, |caps: &Captures<'_>| {
                self.slot(&caps[1]).unwrap_or(&caps[0]).to_string()
            })
            .into_owned()
    }

    /// Escape `text` as HTML, replacing inline slots with their math.
    pub fn fill_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INLINE_SLOT.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&html_escape(&text[last..whole.start()]));
            match self.slot(&caps[1]) {
                Some(html) => out.push_str(html),
                None => out.push_str(&html_escape(whole.as_str())),
            }
            last = whole.end();
        }
        out.push_str(&html_escape(&text[last..]));
        out
    }

    fn slot(&self, index: &str) -> Option<&str> {
        let index: usize = index.parse().ok()?;
        self.rendered.get(index).map(String::as_str)
    }
}

fn render_span(engine: &dyn MathEngine, tex: &str, mode: RenderMode) -> String {
    let (tag, class) = match mode {
        RenderMode::Display => ("div", "math-block"),
        RenderMode::Inline => ("span", "math-inline"),
    };
    match engine.render(tex.trim(), mode) {
        Ok(html) => format!("<{tag} class=\"{class}\">{html}</{tag}>"),
        Err(e) => {
            tracing::warn!("failed to render math `{}`: {e}", tex.trim());
            format!(
                "<{tag} class=\"math-error\">Math Error: {}</{tag}>",
                html_escape(&e.to_string())
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the expression, failing on anything containing `1/0`.
    struct EchoEngine;

    impl MathEngine for EchoEngine {
        fn render(&self, tex: &str, mode: RenderMode) -> Result<String, MathError> {
            if tex.contains("1/0") {
                return Err(MathError("division by <zero>".to_string()));
            }
            Ok(format!("[{mode:?}:{tex}]"))
        }
    }

    #[test]
    fn test_display_and_inline_slots() {
        let mut slots = MathSlots::default();
        let out = slots.extract("a $x^2$ b\n\n$$\n\\sum x\n$$\n", true, &EchoEngine);
        assert_eq!(
            out,
            "a \u{E000}1\u{E001} b\n\n\n\n<x-math data-slot=\"0\" />\n\n\n"
        );
        assert_eq!(
            slots.fill_html("<x-math data-slot=\"0\" />\n"),
            "<div class=\"math-block\">[Display:\\sum x]</div>\n"
        );
        assert_eq!(
            slots.fill_text("a \u{E000}1\u{E001} < b"),
            "a <span class=\"math-inline\">[Inline:x^2]</span> &lt; b"
        );
    }

    #[test]
    fn test_display_inside_line_is_not_padded() {
        let mut slots = MathSlots::default();
        let out = slots.extract("> $$y$$", true, &EchoEngine);
        assert_eq!(out, "> <x-math data-slot=\"0\" />");

        let out = slots.extract("$$z$$ tail", false, &EchoEngine);
        assert_eq!(out, "<x-math data-slot=\"1\" /> tail");
    }

    #[test]
    fn test_inline_does_not_span_lines() {
        let input = "costs $5\nand $6";
        let mut slots = MathSlots::default();
        assert_eq!(slots.extract(input, true, &EchoEngine), input);
    }

    #[test]
    fn test_failure_is_contained() {
        let mut slots = MathSlots::default();
        let out = slots.extract("$$ 1/0 $$ then $y$", false, &EchoEngine);
        assert_eq!(out, "<x-math data-slot=\"0\" /> then \u{E000}1\u{E001}");
        assert_eq!(
            slots.fill_html(&out),
            "<div class=\"math-error\">Math Error: division by &lt;zero&gt;</div> then \u{E000}1\u{E001}"
        );
    }

    #[test]
    fn test_unknown_slot_is_kept() {
        let slots = MathSlots::default();
        assert_eq!(slots.fill_html("<x-math data-slot=\"7\" />"), "<x-math data-slot=\"7\" />");
        assert_eq!(slots.fill_text("\u{E000}7\u{E001}"), "\u{E000}7\u{E001}");
    }

    #[test]
    fn test_mathml_engine() {
        let html = MathMl.render("x^2", RenderMode::Inline).unwrap();
        assert!(html.starts_with("<math"));
        assert!(html.contains("<msup>"));

        let block = MathMl.render("x^2", RenderMode::Display).unwrap();
        assert!(block.contains("display=\"block\""));
    }
}
