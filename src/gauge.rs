use crate::preferences::Thresholds;
use crate::text::Line;
use crate::theme::{tier_for, Role};

pub const FILLED: char = '█';
pub const EMPTY: char = '-';

/// A bracketed horizontal bar: `[█████-----]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge {
    /// Current value, nominally 0.0 – 100.0.
    pub percent: f64,
    /// Number of bar cells between the brackets.
    pub length: usize,
}

impl Gauge {
    pub fn new(percent: f64, length: usize) -> Self {
        Self { percent, length }
    }

    pub fn filled(&self) -> usize {
        filled_cells(self.percent, self.length)
    }

    /// The bar as styled text; the solid part carries the percent's tier.
    pub fn line(&self, thresholds: &Thresholds) -> Line {
        let filled = self.filled();
        let tier = tier_for(self.percent, thresholds);
        Line::plain("[")
            .role(FILLED.to_string().repeat(filled), Role::Value(tier))
            .text(EMPTY.to_string().repeat(self.length - filled))
            .text("]")
    }
}

/// `floor(length * percent / 100)` clamped to `0..=length`.
pub fn filled_cells(percent: f64, length: usize) -> usize {
    if percent.is_nan() {
        return 0;
    }
    let cells = (length as f64 * percent / 100.0).floor();
    cells.clamp(0.0, length as f64) as usize
}
