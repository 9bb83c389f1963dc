//! Input block and bottom bar.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::super::app::App;
use super::super::shortcuts::labels;

fn placeholder(app: &App) -> &'static str {
    let state = app.state();
    if state.user.is_none() {
        "Sign in first (Alt+A)"
    } else if state.selected_category_name().is_none() {
        "Choose a category first (Ctrl+K)"
    } else if app.thinking {
        "Waiting for the assistant..."
    } else {
        "Ask anything... "
    }
}

/// Draw the input block and set cursor position (only when no popup has focus).
pub(crate) fn draw_input(f: &mut Frame, app: &mut App, input_area: Rect) {
    let palette = app.palette();
    let border = if app.thinking {
        palette.dim
    } else {
        palette.accent
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = input_block.inner(input_area);

    // Keep the tail of long input visible.
    let width = inner.width as usize;
    let count = app.input.chars().count();
    let visible: String = if count >= width && width > 0 {
        app.input.chars().skip(count + 1 - width).collect()
    } else {
        app.input.clone()
    };
    let content = if app.input.is_empty() {
        Line::from(Span::styled(placeholder(app), Style::default().fg(palette.dim)))
    } else {
        Line::from(Span::raw(visible.clone()))
    };
    f.render_widget(
        Paragraph::new(content)
            .block(input_block)
            .style(Style::default().fg(palette.text)),
        input_area,
    );
    if app.popup.is_none() {
        let cx = inner.x + visible.chars().count().min(width) as u16;
        f.set_cursor_position(Position::new(cx, inner.y));
    }
}

pub(crate) fn draw_bottom_bar(f: &mut Frame, app: &mut App, area: Rect) {
    let (offers_copy, offers_preview) = app
        .last_reply_content()
        .map(|c| (c.flags.offers_copy_code(), c.flags.offers_preview()))
        .unwrap_or((false, false));
    let paragraph = Paragraph::new(labels::bottom_bar(
        app.thinking,
        offers_copy,
        offers_preview,
    ))
    .style(Style::default().fg(app.palette().dim));
    f.render_widget(paragraph, area);
}
