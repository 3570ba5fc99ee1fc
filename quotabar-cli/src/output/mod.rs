//! Output formatting for CLI.

mod json;
mod oneline;
mod style;
mod text;

pub use json::format_json;
pub use oneline::{OnelineFormatter, OnelineWindow};
pub use style::Style;
pub use text::TextFormatter;
