//! Styled text: plain content tagged with an optional [`Role`].
//!
//! Colors are only turned into escape sequences by the renderer, so the
//! width of a [`Line`] is just the character count of its spans.

use crate::theme::Role;

const ESC: char = '\u{1b}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub role: Option<Role>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), role: None }
    }

    pub fn styled(text: impl Into<String>, role: Role) -> Self {
        Self { text: text.into(), role: Some(role) }
    }

    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// One row of styled content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().push(Span::plain(text))
    }

    pub fn styled(text: impl Into<String>, role: Role) -> Self {
        Self::new().push(Span::styled(text, role))
    }

    /// Append a span; empty spans are dropped.
    pub fn push(mut self, span: Span) -> Self {
        if !span.text.is_empty() {
            self.spans.push(span);
        }
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.push(Span::plain(text))
    }

    pub fn role(self, text: impl Into<String>, role: Role) -> Self {
        self.push(Span::styled(text, role))
    }

    pub fn append(mut self, other: Line) -> Self {
        self.spans.extend(other.spans);
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Display width in terminal cells.
    pub fn width(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }

    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Width of an already-rendered string, skipping escape sequences.
///
/// Handles CSI sequences (`ESC [ params intermediates final`) and two-byte
/// `ESC x` sequences.
pub fn visible_width(raw: &str) -> usize {
    let mut width = 0;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != ESC {
            width += 1;
            continue;
        }
        match chars.next() {
            Some('[') => {
                // parameters and intermediates run until a final byte in @..~
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            Some(_) | None => {}
        }
    }
    width
}
