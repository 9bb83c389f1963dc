//! TUI rendering: layout and widgets for the chat interface.

mod header;
mod history;
mod input;
mod popups;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::Instant;

use super::app::{App, Popup};
use super::constants::INPUT_HEIGHT;

const HEADER_HEIGHT: u16 = 2;
const BOTTOM_BAR_HEIGHT: u16 = 2;

pub(super) fn draw(f: &mut Frame, app: &mut App, area: Rect) {
    let palette = app.palette();
    f.render_widget(
        Block::default().style(Style::default().fg(palette.text)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(BOTTOM_BAR_HEIGHT),
        ])
        .split(area);
    header::draw_header(f, app, chunks[0]);
    if app.state().transcript.is_empty() {
        history::draw_welcome(f, app, chunks[1]);
    } else {
        history::draw_history(f, app, chunks[1]);
    }
    input::draw_input(f, app, chunks[2]);
    input::draw_bottom_bar(f, app, chunks[3]);

    if let Some(mut popup) = app.popup.take() {
        match &mut popup {
            Popup::Auth(form) => popups::draw_auth_popup(f, area, form, &palette),
            Popup::Account => popups::draw_account_popup(f, area, app.state(), &palette),
            Popup::Category(list) => {
                popups::draw_category_popup(f, area, app.state(), list, &palette)
            }
            Popup::History(selector) => {
                popups::draw_history_popup(f, area, app.state(), selector, &palette)
            }
            Popup::Upgrade(upgrade) => {
                popups::draw_upgrade_popup(f, area, app.state(), upgrade, &palette)
            }
        }
        app.popup = Some(popup);
    }

    // Toast: top right, below header. Opaque background so it's visible over history.
    if let Some(toast) = &app.toast {
        if toast.until > Instant::now() {
            let text = format!(" {} ", toast.text);
            let width = (text.chars().count() as u16 + 2).min(area.width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(width).saturating_sub(1),
                y: area.y + HEADER_HEIGHT,
                width,
                height: 3,
            };
            let color = if toast.is_error {
                palette.error
            } else {
                palette.accent
            };
            f.render_widget(Clear, toast_area);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(palette.surface));
            let para = Paragraph::new(Line::from(text))
                .block(block)
                .style(Style::default().fg(color).bg(palette.surface));
            f.render_widget(para, toast_area);
        } else {
            app.toast = None;
        }
    }
}
