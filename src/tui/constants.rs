//! TUI constants: colors, timing, and layout sizes.

use ratatui::style::Color;

use crate::core::state::Theme;

/// Accent green color (#98FB98).
pub(super) const ACCENT: Color = Color::Rgb(152, 251, 152);

/// Secondary accent, soft cyan (#7EC8E3) that pairs with the green.
pub(super) const ACCENT_SECONDARY: Color = Color::Rgb(126, 200, 227);

/// Event poll timeout in milliseconds (main loop).
pub(crate) const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// How long to wait for the key following Esc (Option as meta on some terminals).
pub(crate) const ESC_SEQUENCE_DRAIN_MS: u64 = 150;

/// Scroll amount for arrow keys and mouse wheel.
pub(crate) const SCROLL_LINES_SMALL: usize = 3;

/// Scroll amount for PageUp/PageDown.
pub(crate) const SCROLL_LINES_PAGE: usize = 10;

/// Input block height (borders included).
pub(crate) const INPUT_HEIGHT: u16 = 3;

/// How long a toast stays on screen.
pub(crate) const TOAST_SECS: u64 = 3;

/// Minimalist logo when idle (single character).
pub(super) const LOGO_IDLE: &str = "◆";

/// Spinner frames for "thinking" animation (braille pattern, 4 frames).
pub(super) const LOGO_THINKING: &[&str] = &["⠋", "⠙", "⠹", "⠸"];

/// Colors that change with the light/dark theme.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Palette {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub code: Color,
    pub term: Color,
    pub user_border: Color,
    pub error: Color,
    /// Background for selected list rows and toasts.
    pub surface: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                dim: Color::DarkGray,
                accent: ACCENT,
                code: ACCENT_SECONDARY,
                term: Color::Yellow,
                user_border: Color::DarkGray,
                error: Color::Red,
                surface: Color::Black,
            },
            Theme::Light => Self {
                text: Color::Black,
                dim: Color::Gray,
                accent: Color::Rgb(34, 139, 34),
                code: Color::Rgb(0, 95, 135),
                term: Color::Rgb(175, 95, 0),
                user_border: Color::Gray,
                error: Color::Rgb(175, 0, 0),
                surface: Color::White,
            },
        }
    }
}
