//! Box framing for the dashboard.
//!
//! Every box is [`BOX_WIDTH`] cells wide from the outer edge of the left
//! border to the outer edge of the right one. A content row is
//! `║ <content><padding> ║`, so content gets `BOX_WIDTH - 4` cells.

use crate::text::Line;
use crate::theme::Role;

pub const BOX_WIDTH: usize = 66;
#[cfg(test)]
pub const CONTENT_WIDTH: usize = BOX_WIDTH - 4;

/// Blank lines above the first box.
pub const MARGIN_TOP: usize = 2;
/// Spaces before every box line.
pub const MARGIN_LEFT: usize = 4;
/// Rows reserved below the dashboard when sizing the terminal window.
pub const MARGIN_BOTTOM: usize = 2;

const TOP_LEFT: char = '╔';
const TOP_RIGHT: char = '╗';
const BOTTOM_LEFT: char = '╚';
const BOTTOM_RIGHT: char = '╝';
const HORIZONTAL: char = '═';
const VERTICAL: char = '║';

/// A titled (or untitled) box of content rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    title: Option<String>,
    rows: Vec<Line>,
}

impl Panel {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), rows: Vec::new() }
    }

    pub fn untitled() -> Self {
        Self::default()
    }

    pub fn row(mut self, line: Line) -> Self {
        self.rows.push(line);
        self
    }

    pub fn push_row(&mut self, line: Line) {
        self.rows.push(line);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Line] {
        &self.rows
    }

    /// Top rule, bordered rows and bottom rule, each `width` cells wide.
    pub fn lines(&self, width: usize) -> Vec<Line> {
        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(top_rule(width, self.title()));
        out.extend(self.rows.iter().map(|row| bordered_row(width, row)));
        out.push(bottom_rule(width));
        out
    }
}

/// Spaces needed after `content_width` cells of content; never negative.
pub fn padding_for(width: usize, content_width: usize) -> usize {
    width.saturating_sub(4).saturating_sub(content_width)
}

/// `║ content<padding> ║`. Over-wide content is not truncated: the right
/// border is pushed out instead of cutting through styled text.
pub fn bordered_row(width: usize, content: &Line) -> Line {
    let padding = padding_for(width, content.width());
    Line::styled(VERTICAL.to_string(), Role::Border)
        .text(" ")
        .append(content.clone())
        .text(" ".repeat(padding + 1))
        .role(VERTICAL.to_string(), Role::Border)
}

/// `╔═══ TITLE ═══╗`, or a plain rule when there is no title.
pub fn top_rule(width: usize, title: Option<&str>) -> Line {
    let inner = width.saturating_sub(2);
    let Some(title) = title else {
        return Line::styled(rule(TOP_LEFT, inner, TOP_RIGHT), Role::Border);
    };
    let label_width = title.chars().count() + 2;
    let spare = inner.saturating_sub(label_width);
    let left = spare / 2;
    let right = spare - left;
    Line::styled(format!("{TOP_LEFT}{} ", horizontal(left)), Role::Border)
        .role(title, Role::Title)
        .role(format!(" {}{TOP_RIGHT}", horizontal(right)), Role::Border)
}

pub fn bottom_rule(width: usize) -> Line {
    Line::styled(rule(BOTTOM_LEFT, width.saturating_sub(2), BOTTOM_RIGHT), Role::Border)
}

fn rule(left: char, inner: usize, right: char) -> String {
    format!("{left}{}{right}", horizontal(inner))
}

fn horizontal(n: usize) -> String {
    HORIZONTAL.to_string().repeat(n)
}
