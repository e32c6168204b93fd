use crate::core::budget::ProgressColor;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_SLOTS: usize = 20;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
    Success,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
        StyleType::Success => style(text).green(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned cell for a formatted amount.
pub fn money_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Signed amount coloured green for inflows and red for outflows.
pub fn signed_money_cell(text: String, positive: bool) -> Cell {
    let color = if positive { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

pub fn progress_color(color: ProgressColor) -> Color {
    match color {
        ProgressColor::Danger => Color::Red,
        ProgressColor::Warning => Color::Yellow,
        ProgressColor::Caution => Color::DarkYellow,
        ProgressColor::Success => Color::Green,
    }
}

/// Text progress bar for a width in [0, 100], with an optional overflow
/// marker for amounts past the end.
pub fn progress_bar_text(width: f64, overlay: f64) -> String {
    let filled = ((width.clamp(0.0, 100.0) / 100.0) * BAR_SLOTS as f64).round() as usize;
    let mut bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_SLOTS - filled)
    );
    if overlay > 0.0 {
        bar.push_str(&format!(" +{overlay:.0}%"));
    }
    bar
}

/// Cell with a coloured progress bar and percentage.
pub fn progress_cell(percent: f64, width: f64, overlay: f64, color: ProgressColor) -> Cell {
    Cell::new(format!(
        "{} {percent:.1}%",
        progress_bar_text(width, overlay)
    ))
    .fg(progress_color(color))
}

/// Creates a spinner shown while waiting on the server.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_text() {
        assert_eq!(progress_bar_text(0.0, 0.0), "░".repeat(20));
        assert_eq!(progress_bar_text(100.0, 0.0), "█".repeat(20));
        assert_eq!(
            progress_bar_text(50.0, 0.0),
            format!("{}{}", "█".repeat(10), "░".repeat(10))
        );
        assert_eq!(
            progress_bar_text(100.0, 50.0),
            format!("{} +50%", "█".repeat(20))
        );
    }

    #[test]
    fn test_progress_bar_clamps_width() {
        assert_eq!(progress_bar_text(250.0, 0.0), "█".repeat(20));
        assert_eq!(progress_bar_text(-5.0, 0.0), "░".repeat(20));
    }
}
