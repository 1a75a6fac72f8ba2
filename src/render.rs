use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use std::fmt::Write as _;
use std::io::{self, Write};
use tracing::debug;

use crate::layout::{Panel, BOX_WIDTH, MARGIN_LEFT, MARGIN_TOP};
use crate::text::{visible_width, Line};
use crate::theme::Palette;

/// One complete dashboard screen, already resolved to terminal text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Turns styled [`Line`]s into escape-sequence strings.
#[derive(Debug, Clone)]
pub struct Renderer {
    palette: Palette,
    width: usize,
    margin_left: usize,
    margin_top: usize,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            width: BOX_WIDTH,
            margin_left: MARGIN_LEFT,
            margin_top: MARGIN_TOP,
        }
    }

    /// Each styled span gets its color and an immediate reset, so no
    /// style leaks into the next span.
    pub fn line(&self, line: &Line) -> String {
        let mut out = " ".repeat(self.margin_left);
        for span in line.spans() {
            match span.role {
                Some(role) => {
                    let _ = write!(out, "{}", span.text.as_str().with(self.palette.color(role)));
                }
                None => out.push_str(&span.text),
            }
        }
        out
    }

    /// Panels stacked top to bottom with a blank line between them.
    pub fn frame(&self, panels: &[Panel]) -> Frame {
        let mut lines = vec![String::new(); self.margin_top];
        for (i, panel) in panels.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            for line in panel.lines(self.width) {
                let rendered = self.line(&line);
                let shown = visible_width(&rendered);
                if shown > self.margin_left + self.width {
                    debug!(shown, "row overflows its box");
                }
                lines.push(rendered);
            }
        }
        Frame { lines }
    }
}

/// Replace whatever is on screen with `frame`. The frame is written in
/// one flush after the clear.
pub fn present<W: Write>(out: &mut W, frame: &Frame) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    out.write_all(frame.to_text().as_bytes())?;
    out.flush()
}
