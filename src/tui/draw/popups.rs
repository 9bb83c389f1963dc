//! Popups: account form, category picker, saved conversations, upgrade flow.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Flex, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::core::history;
use crate::core::state::AppState;

use super::super::app::{
    AuthField, AuthFormState, HistoryPopupState, ListPopupState, UpgradeStage, UpgradeState,
    upgrade_plans,
};
use super::super::constants::Palette;

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let vertical_areas = vertical.split(area);
    let horizontal_areas = horizontal.split(vertical_areas[0]);
    horizontal_areas[0]
}

fn popup_block<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(Style::default().bg(palette.surface).fg(palette.text))
        .title(title)
}

fn hint_line(pairs: &[(&'static str, &'static str)], palette: &Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, action) in pairs {
        spans.push(Span::styled(format!("{} ", key), Style::default().fg(palette.dim)));
        spans.push(Span::raw(format!("{}  ", action)));
    }
    Line::from(spans)
}

/// Draw a selectable list; `selected_index` is clamped to the item count.
fn draw_list(
    f: &mut Frame,
    area: Rect,
    items: Vec<String>,
    selected_index: &mut usize,
    list_state: &mut ListState,
    empty_message: &str,
    palette: &Palette,
) {
    if items.is_empty() {
        let para = Paragraph::new(Line::from(Span::styled(
            empty_message.to_string(),
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        )));
        f.render_widget(para, area);
        return;
    }
    *selected_index = (*selected_index).min(items.len() - 1);
    let highlight = Style::default().fg(palette.surface).bg(palette.accent);
    let list_items: Vec<ListItem> = items
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let style = if i == *selected_index {
                highlight
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", text)).style(style)
        })
        .collect();
    list_state.select(Some(*selected_index));
    f.render_stateful_widget(
        List::new(list_items).highlight_style(highlight),
        area,
        list_state,
    );
}

pub(crate) fn draw_auth_popup(f: &mut Frame, area: Rect, form: &AuthFormState, palette: &Palette) {
    let popup_rect = popup_area(area, 60, 50);
    let block = popup_block(form.mode.title(), palette);
    let inner = block.inner(popup_rect);
    f.render_widget(Clear, popup_rect);
    f.render_widget(block, popup_rect);

    let fields = form.mode.fields();
    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(1));
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let focused = form.focused_field();
    for (i, field) in fields.iter().enumerate() {
        let value = form.field(*field);
        let shown = if *field == AuthField::Password {
            "•".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let is_focused = *field == focused;
        let border = if is_focused { palette.accent } else { palette.dim };
        let field_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", field.label()));
        let field_inner = field_block.inner(chunks[i]);
        f.render_widget(Paragraph::new(shown.clone()).block(field_block), chunks[i]);
        if is_focused && !form.busy {
            let cx = field_inner.x + shown.chars().count().min(field_inner.width as usize) as u16;
            f.set_cursor_position(Position::new(cx, field_inner.y));
        }
    }

    let status_area = chunks[fields.len()];
    let status = if form.busy {
        Line::from(Span::styled(
            "Contacting server...",
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(err) = &form.error {
        Line::from(Span::styled(err.clone(), Style::default().fg(palette.error)))
    } else if let Some(notice) = &form.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(palette.accent)))
    } else {
        Line::from("")
    };
    f.render_widget(
        Paragraph::new(status).wrap(Wrap { trim: true }),
        status_area,
    );

    let hint = hint_line(
        &[
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Ctrl+R", "switch form"),
            ("Esc", "close"),
        ],
        palette,
    );
    f.render_widget(Paragraph::new(hint), chunks[fields.len() + 1]);
}

pub(crate) fn draw_account_popup(f: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let popup_rect = popup_area(area, 50, 40);
    let block = popup_block(" Account ", palette);
    f.render_widget(Clear, popup_rect);

    let mut lines = vec![Line::from("")];
    if let Some(user) = &state.user {
        lines.push(Line::from(vec![
            Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  <{}>", user.email), Style::default().fg(palette.dim)),
        ]));
        lines.push(Line::from(format!("Plan: {}", user.plan)));
        lines.push(Line::from(format!("Messages: {}", user.usage_label())));
    }
    lines.push(Line::from(""));
    lines.push(hint_line(&[("o", "sign out"), ("u", "upgrade"), ("Esc", "close")], palette));
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center),
        popup_rect,
    );
}

pub(crate) fn draw_category_popup(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    list: &mut ListPopupState,
    palette: &Palette,
) {
    let popup_rect = popup_area(area, 60, 50);
    let block = popup_block(" Select category (Ctrl+K) ", palette);
    let inner = block.inner(popup_rect);
    f.render_widget(Clear, popup_rect);
    f.render_widget(block, popup_rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);
    let items = state
        .settings
        .categories
        .iter()
        .map(|c| {
            let marker = if state.category.as_deref() == Some(c.id.as_str()) {
                "● "
            } else {
                "  "
            };
            if c.description.is_empty() {
                format!("{}{}", marker, c.name)
            } else {
                format!("{}{}  {}", marker, c.name, c.description)
            }
        })
        .collect();
    draw_list(
        f,
        chunks[0],
        items,
        &mut list.selected_index,
        &mut list.list_state,
        "No categories configured",
        palette,
    );
    let hint = hint_line(&[("↑↓", "select"), ("Enter", "confirm"), ("Esc", "cancel")], palette);
    f.render_widget(Paragraph::new(hint), chunks[1]);
}

pub(crate) fn draw_history_popup(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    selector: &mut HistoryPopupState,
    palette: &Palette,
) {
    let popup_rect = popup_area(area, 70, 60);
    let block = popup_block(" Saved conversations (Alt+H) ", palette);
    let inner = block.inner(popup_rect);
    f.render_widget(Clear, popup_rect);
    f.render_widget(block, popup_rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let filter_content = if selector.filter.is_empty() {
        Span::styled("Filter... ", Style::default().fg(palette.dim))
    } else {
        Span::raw(selector.filter.clone())
    };
    let filter_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim));
    let filter_inner = filter_block.inner(chunks[0]);
    f.render_widget(
        Paragraph::new(Line::from(filter_content)).block(filter_block),
        chunks[0],
    );
    let cx = filter_inner.x
        + selector
            .filter
            .chars()
            .count()
            .min(filter_inner.width as usize) as u16;
    f.set_cursor_position(Position::new(cx, filter_inner.y));

    let items = history::filter(&state.saved, &selector.filter)
        .into_iter()
        .map(|c| {
            format!(
                "{}  {}  {}",
                c.saved_at
                    .with_timezone(&chrono::Local)
                    .format("%m-%d %H:%M"),
                c.category.as_deref().unwrap_or("-"),
                c.title
            )
        })
        .collect();
    let empty = if selector.filter.is_empty() {
        "No saved conversations"
    } else {
        "No conversations match filter"
    };
    draw_list(
        f,
        chunks[1],
        items,
        &mut selector.selected_index,
        &mut selector.list_state,
        empty,
        palette,
    );
    let hint = hint_line(
        &[
            ("↑↓", "select"),
            ("Enter", "restore"),
            ("Ctrl+D", "delete"),
            ("Ctrl+X", "clear all"),
            ("Esc", "close"),
        ],
        palette,
    );
    f.render_widget(Paragraph::new(hint), chunks[2]);
}

pub(crate) fn draw_upgrade_popup(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    upgrade: &mut UpgradeState,
    palette: &Palette,
) {
    let popup_rect = popup_area(area, 60, 50);
    let block = popup_block(" Upgrade plan ", palette);
    let inner = block.inner(popup_rect);
    f.render_widget(Clear, popup_rect);
    f.render_widget(block, popup_rect);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let intro = match (upgrade.blocked_at, &state.user) {
        (Some((used, limit)), _) => format!(
            "You have used {} of {} messages. Upgrade to keep chatting.",
            used, limit
        ),
        (None, Some(user)) => format!("Current plan: {} ({})", user.plan, user.usage_label()),
        (None, None) => "Sign in to upgrade.".to_string(),
    };
    f.render_widget(
        Paragraph::new(intro).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let hint = match &mut upgrade.stage {
        UpgradeStage::Choosing(list) => {
            let items = upgrade_plans(state)
                .into_iter()
                .map(|p| format!("{:<12} {:>6}  {} messages", p.name, p.price, p.message_limit))
                .collect();
            draw_list(
                f,
                chunks[1],
                items,
                &mut list.selected_index,
                &mut list.list_state,
                "You are on the highest plan",
                palette,
            );
            hint_line(&[("↑↓", "select"), ("Enter", "pay"), ("Esc", "cancel")], palette)
        }
        UpgradeStage::Waiting { plan_name, url } => {
            let mut lines = vec![Line::from(Span::styled(
                format!("Waiting for payment confirmation for {}...", plan_name),
                Style::default()
                    .fg(palette.dim)
                    .add_modifier(Modifier::ITALIC),
            ))];
            match url {
                Some(url) => {
                    lines.push(Line::from(""));
                    lines.push(Line::from("Complete the payment in your browser:"));
                    lines.push(Line::from(Span::styled(
                        url.clone(),
                        Style::default()
                            .fg(palette.code)
                            .add_modifier(Modifier::UNDERLINED),
                    )));
                }
                None => lines.push(Line::from("Opening the payment page...")),
            }
            f.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: false }),
                chunks[1],
            );
            hint_line(&[("Esc", "stop waiting")], palette)
        }
        UpgradeStage::Finished { message, is_error } => {
            let color = if *is_error {
                palette.error
            } else {
                palette.accent
            };
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(color),
                )))
                .wrap(Wrap { trim: true }),
                chunks[1],
            );
            hint_line(&[("Enter/Esc", "close")], palette)
        }
    };
    f.render_widget(Paragraph::new(hint), chunks[2]);
}
