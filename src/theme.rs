use crossterm::style::Color;
use serde::{Deserialize, Serialize};

use crate::preferences::{ColorScheme, Thresholds};

// ─── COLOR NAMES ────────────────────────────────────────────────

/// Symbolic terminal color as written in the config file.
///
/// Unknown names never fail the document: they resolve to `White`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorName {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl ColorName {
    pub const ALL: &[ColorName] = &[
        ColorName::Black,
        ColorName::Red,
        ColorName::Green,
        ColorName::Yellow,
        ColorName::Blue,
        ColorName::Magenta,
        ColorName::Cyan,
        ColorName::White,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorName::Black => "black",
            ColorName::Red => "red",
            ColorName::Green => "green",
            ColorName::Yellow => "yellow",
            ColorName::Blue => "blue",
            ColorName::Magenta => "magenta",
            ColorName::Cyan => "cyan",
            ColorName::White => "white",
        }
    }

    /// The standard (30–37) terminal color for this name.
    pub fn color(&self) -> Color {
        match self {
            ColorName::Black => Color::Black,
            ColorName::Red => Color::DarkRed,
            ColorName::Green => Color::DarkGreen,
            ColorName::Yellow => Color::DarkYellow,
            ColorName::Blue => Color::DarkBlue,
            ColorName::Magenta => Color::DarkMagenta,
            ColorName::Cyan => Color::DarkCyan,
            ColorName::White => Color::Grey,
        }
    }
}

impl From<String> for ColorName {
    fn from(name: String) -> Self {
        let name = name.trim();
        ColorName::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .unwrap_or(ColorName::White)
    }
}

impl From<ColorName> for String {
    fn from(color: ColorName) -> Self {
        color.name().to_string()
    }
}

// ─── TIERS ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Low,
    Mid,
    High,
}

/// Classify a percentage against the configured thresholds.
///
/// `Low` below `mid`, `Mid` in `[mid, high)`, `High` from `high` up. Every
/// gauge and colored percentage on the dashboard goes through here.
pub fn tier_for(percent: f64, thresholds: &Thresholds) -> Tier {
    if percent < thresholds.mid {
        Tier::Low
    } else if percent < thresholds.high {
        Tier::Mid
    } else {
        Tier::High
    }
}

// ─── ROLES & PALETTE ────────────────────────────────────────────

/// What a piece of styled text is, independent of how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Label,
    Value(Tier),
    Alert,
    Border,
    Title,
    Heading,
}

/// Concrete colors for every [`Role`], derived from the color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub label: Color,
    pub low: Color,
    pub mid: Color,
    pub high: Color,
    pub alert: Color,
    pub border: Color,
    pub title: Color,
    pub heading: Color,
}

impl Palette {
    pub fn from_scheme(scheme: &ColorScheme) -> Self {
        Self {
            label: scheme.label.color(),
            low: scheme.value_low.color(),
            mid: scheme.value_mid.color(),
            high: scheme.value_high.color(),
            alert: scheme.alert.color(),
            border: ColorName::Cyan.color(),
            title: ColorName::Yellow.color(),
            heading: ColorName::Yellow.color(),
        }
    }

    pub fn color(&self, role: Role) -> Color {
        match role {
            Role::Label => self.label,
            Role::Value(Tier::Low) => self.low,
            Role::Value(Tier::Mid) => self.mid,
            Role::Value(Tier::High) => self.high,
            Role::Alert => self.alert,
            Role::Border => self.border,
            Role::Title => self.title,
            Role::Heading => self.heading,
        }
    }
}
