//! Status markers: emoji icons or ANSI-colored text.

use quotabar_store::Level;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BOLD_RED: &str = "\x1b[1;31m";

/// How status is shown next to a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Trailing emoji icon.
    Emoji,
    /// The figure itself is colored; no icons.
    Color,
}

impl Style {
    /// Picks the style from the `--noemoji` flag.
    pub fn from_noemoji(noemoji: bool) -> Self {
        if noemoji { Self::Color } else { Self::Emoji }
    }

    /// Returns the icon for a level.
    pub fn icon(level: Level) -> &'static str {
        match level {
            Level::Ok => "✅",
            Level::Warning => "⚠️",
            Level::Critical => "🔴",
            Level::Exhausted => "❌",
        }
    }

    fn color(level: Level) -> &'static str {
        match level {
            Level::Ok => GREEN,
            Level::Warning => YELLOW,
            Level::Critical => RED,
            Level::Exhausted => BOLD_RED,
        }
    }

    /// Decorates `figure` according to `level`.
    ///
    /// `suffix` goes between the figure and the icon, e.g. `" (5h)"`.
    pub fn mark(self, figure: &str, suffix: &str, level: Level) -> String {
        match self {
            Self::Emoji => format!("{figure}{suffix} {}", Self::icon(level)),
            Self::Color => format!("{}{figure}{RESET}{suffix}", Self::color(level)),
        }
    }

    /// Marker for a provider that failed.
    pub fn error_marker(self) -> String {
        match self {
            Self::Emoji => "❌".to_string(),
            Self::Color => format!("{BOLD_RED}ERR{RESET}"),
        }
    }

    /// Section heading emphasis.
    pub fn bold(self, text: &str) -> String {
        match self {
            Self::Emoji => text.to_string(),
            Self::Color => format!("{BOLD}{text}{RESET}"),
        }
    }

    /// Prefixes a detail line with an icon, or nothing in color mode.
    pub fn prefixed(self, icon: &str, text: &str) -> String {
        match self {
            Self::Emoji => format!("{icon} {text}"),
            Self::Color => text.to_string(),
        }
    }
}

// ============================================================================
// Number Formatting
// ============================================================================

/// Formats a percentage, dropping a trailing `.0`.
pub fn percent(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}%")
    } else {
        format!("{value:.1}%")
    }
}

/// Formats an integer with thousands separators.
pub fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a USD amount.
pub fn usd(amount: f64) -> String {
    format!("${amount:.2}")
}
