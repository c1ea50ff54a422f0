use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language};

use crate::util::html_escape;

/// A syntax highlighter using autumnus (tree-sitter based).
///
/// Output uses CSS classes; the site stylesheet provides the colours.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxHighlighter;

impl SyntaxHighlighter {
    /// Highlight `code` written in `language`.
    ///
    /// An empty `language` asks autumnus to guess from the code itself, which
    /// only recognises shebang lines; anything else comes out as plain text. An
    /// unrecognised language, or any highlighter failure, yields the escaped
    /// code in a plain `<pre><code>` block.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let lang = Language::guess(language, code);

        if matches!(lang, Language::PlainText)
            && !language.is_empty()
            && language != "plaintext"
            && language != "text"
        {
            tracing::debug!("no highlighter for language `{language}`");
            return Self::plain_code_block(code, language);
        }

        let formatter = HtmlLinkedBuilder::new().source(code).lang(lang).build();

        match formatter {
            Ok(f) => {
                let mut output: Vec<u8> = Vec::new();
                if f.format(&mut output).is_ok() {
                    String::from_utf8(output)
                        .unwrap_or_else(|_| Self::plain_code_block(code, language))
                } else {
                    Self::plain_code_block(code, language)
                }
            }
            Err(_) => Self::plain_code_block(code, language),
        }
    }

    /// Create a plain code block without highlighting.
    pub fn plain_code_block(code: &str, language: &str) -> String {
        let escaped = html_escape(code);
        if language.is_empty() {
            format!("<pre><code>{}</code></pre>", escaped)
        } else {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                html_escape(language),
                escaped
            )
        }
    }
}
