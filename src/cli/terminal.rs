//! Terminal styling and layout for review output

use owo_colors::{OwoColorize, colors::css};
use vmatrix::{Severity, Verdict, engine::CoverageStatus};

/// Below this many columns, tables are printed stacked.
const NARROW_COLUMNS: u16 = 60;

/// Detects whether colored output should be enabled
fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Check if the terminal is too narrow for tabular output
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < NARROW_COLUMNS)
}

/// How a piece of review output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// A passing outcome (green)
    Good,
    /// Worth a look, but not a failure (amber)
    Caution,
    /// A failing outcome (bold red)
    Bad,
    /// Section headings (blue)
    Heading,
    /// Secondary detail (dimmed)
    Muted,
}

/// Review outcomes with a fixed label and style.
pub trait Styled {
    /// The word printed for this outcome.
    fn label(&self) -> &'static str;

    /// How the label is rendered.
    fn style(&self) -> Style;

    /// The label left-aligned to `width`, then painted.
    fn painted(&self, width: usize) -> String {
        paint(&format!("{:<width$}", self.label()), self.style())
    }
}

impl Styled for Severity {
    fn label(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn style(&self) -> Style {
        match self {
            Self::Warning => Style::Caution,
            Self::Error => Style::Bad,
        }
    }
}

impl Styled for CoverageStatus {
    fn label(&self) -> &'static str {
        match self {
            Self::Covered => "covered",
            Self::Uncovered => "uncovered",
        }
    }

    fn style(&self) -> Style {
        match self {
            Self::Covered => Style::Good,
            Self::Uncovered => Style::Bad,
        }
    }
}

impl Styled for Verdict {
    fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    fn style(&self) -> Style {
        match self {
            Self::Pass => Style::Good,
            Self::Fail => Style::Bad,
        }
    }
}

/// Render `text` in `style`, or leave it plain when color is unsupported.
///
/// Pad before painting: escape codes count towards format widths.
pub fn paint(text: &str, style: Style) -> String {
    if !supports_color() {
        return text.to_string();
    }
    match style {
        Style::Good => text.fg::<css::Green>().to_string(),
        Style::Caution => text.fg::<css::Orange>().to_string(),
        Style::Bad => text.fg::<css::Red>().bold().to_string(),
        Style::Heading => text.fg::<css::LightBlue>().to_string(),
        Style::Muted => text.dimmed().to_string(),
    }
}

/// Print a section heading with an underline of matching width.
pub fn heading(title: &str) {
    println!("{}", paint(title, Style::Heading));
    println!("{}", paint(&"─".repeat(title.chars().count()), Style::Muted));
}
