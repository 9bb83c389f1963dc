//! Header: logo, saved count, title, category, account usage.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use std::time::Instant;

use crate::core::app;
use crate::core::quota::User;

use super::super::app::App;
use super::super::constants::{LOGO_IDLE, LOGO_THINKING};
use super::super::text::truncate_start;

/// Start time for header animation phase (thinking spinner).
pub(crate) static HEADER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Max width for the category name in the header.
const CATEGORY_HEADER_WIDTH: u16 = 22;
/// Width for account display (e.g. "dana · pro · 12/1000").
const ACCOUNT_HEADER_WIDTH: u16 = 32;

/// Usage color: green below half the limit, yellow up to 80%, red above or at the limit.
fn usage_color(user: &User) -> Color {
    if user.message_limit == 0 || user.messages_used >= user.message_limit {
        return Color::Red;
    }
    let ratio = user.messages_used as f64 / user.message_limit as f64;
    if ratio > 0.80 {
        Color::Red
    } else if ratio > 0.50 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub(crate) fn draw_header(f: &mut Frame, app: &mut App, area: Rect) {
    let palette = app.palette();
    let state = app.state();
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(0),
            Constraint::Length(CATEGORY_HEADER_WIDTH),
            Constraint::Length(ACCOUNT_HEADER_WIDTH),
        ])
        .split(area);

    let logo_symbol = if app.thinking {
        let start = HEADER_START.get_or_init(Instant::now);
        let phase = start.elapsed().as_millis() as usize;
        LOGO_THINKING[(phase / 80) % LOGO_THINKING.len()]
    } else {
        LOGO_IDLE
    };
    let logo_line = Line::from(vec![
        Span::styled(format!("{} ", logo_symbol), Style::default().fg(palette.accent)),
        Span::styled(
            format!("{} ", state.saved.len()),
            Style::default().fg(palette.dim),
        ),
    ]);
    f.render_widget(Paragraph::new(logo_line), header_chunks[0]);

    let title_str = format!("{} ", app::NAME);
    let title_len = title_str.len() as u16;
    let title_area = Rect {
        x: area.x + area.width.saturating_sub(title_len) / 2,
        y: area.y,
        width: title_len.min(area.width),
        height: area.height,
    };
    let title = Line::from(Span::styled(
        title_str,
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(title), title_area);

    let category = state
        .selected_category_name()
        .map(|name| truncate_start(name, CATEGORY_HEADER_WIDTH as usize - 1))
        .unwrap_or_else(|| "no category".to_string());
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            category,
            Style::default().fg(palette.code),
        )))
        .alignment(Alignment::Right),
        header_chunks[2],
    );

    let account_line = match &state.user {
        Some(user) => Line::from(vec![
            Span::styled(
                format!("{} · {} · ", user.name, user.plan),
                Style::default().fg(palette.dim),
            ),
            Span::styled(user.usage_label(), Style::default().fg(usage_color(user))),
        ]),
        None => Line::from(Span::styled(
            "signed out",
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        )),
    };
    f.render_widget(
        Paragraph::new(account_line).alignment(Alignment::Right),
        header_chunks[3],
    );
}
