//! Theme constants for the TUI.

use ratatui::style::Color;
use ratatui::widgets::BorderType;

/// Border type for all panels
pub const BORDER_TYPE: BorderType = BorderType::Rounded;

/// Focused panel border color
pub const FOCUSED: Color = Color::Green;

/// Selected row background
pub const SELECTED_BG: Color = Color::DarkGray;

/// 4 and 5 star ratings
pub const HIGH_RATING: Color = Color::Green;

/// 3 star ratings
pub const MID_RATING: Color = Color::Yellow;

/// 1 and 2 star ratings
pub const LOW_RATING: Color = Color::Red;

/// Active filter or sort indicators
pub const ACTIVE: Color = Color::Cyan;

/// Secondary/dim text
pub const DIM: Color = Color::DarkGray;

/// Status bar color
pub const STATUS_BAR: Color = Color::Blue;

/// Color for a star rating.
#[must_use]
pub const fn rating_color(rating: u8) -> Color {
    match rating {
        4.. => HIGH_RATING,
        3 => MID_RATING,
        _ => LOW_RATING,
    }
}
