//! Chat history: message blocks with borders, term highlighting, code blocks, and scrollbar.
//! Also the welcome view shown before the first message.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};

use crate::core::content::{InlineSpan, PreparedContent, ProseLine, RenderedSegment, highlight_terms};
use crate::core::message::Message;

use super::super::app::App;
use super::super::constants::Palette;
use super::super::text::wrap_message;

/// Repeat a character to fill width (approximate; chars may have different display widths).
fn repeat_char(c: char, n: usize) -> String {
    std::iter::repeat_n(c, n).collect()
}

fn styled_spans(spans: Vec<InlineSpan<'_>>, palette: &Palette) -> Vec<Span<'static>> {
    spans
        .into_iter()
        .map(|span| match span {
            InlineSpan::Plain(s) => Span::raw(s.to_string()),
            InlineSpan::Term(s) => Span::styled(
                s.to_string(),
                Style::default()
                    .fg(palette.term)
                    .add_modifier(Modifier::BOLD),
            ),
        })
        .collect()
}

/// Width settings for one message block.
struct BlockLayout {
    content_width: usize,
    wrap_width: usize,
}

fn push_code_block(
    lines: &mut Vec<Line<'static>>,
    lang: Option<&str>,
    code: &str,
    border_style: Style,
    layout: &BlockLayout,
    palette: &Palette,
) {
    let code_style = Style::default().fg(palette.code);
    let code_inner_width = layout.content_width.saturating_sub(2);
    let code_header = format!("┌─ {} ", lang.unwrap_or("code"));
    let code_trail_len = code_inner_width.saturating_sub(code_header.chars().count() + 1);
    lines.push(Line::from(vec![
        Span::styled("│ ", border_style),
        Span::styled(
            format!("{}{}┐", code_header, repeat_char('─', code_trail_len)),
            code_style,
        ),
    ]));
    for code_line in code.split('\n') {
        for chunk in wrap_message(code_line, code_inner_width) {
            lines.push(Line::from(vec![
                Span::styled("│ ", border_style),
                Span::styled("│ ", code_style),
                Span::styled(chunk, code_style),
            ]));
        }
    }
    lines.push(Line::from(vec![
        Span::styled("│ ", border_style),
        Span::styled(
            format!("└{}┘", repeat_char('─', code_inner_width.saturating_sub(2))),
            code_style,
        ),
    ]));
}

/// Add a message block: "┌─ Label 14:32 ───┐", body, bottom border.
fn add_message_block(
    lines: &mut Vec<Line<'static>>,
    message: &Message,
    show_timestamp: bool,
    layout: &BlockLayout,
    palette: &Palette,
) {
    let border_style = Style::default().fg(if message.is_user {
        palette.user_border
    } else {
        palette.code
    });

    let label = if message.is_user { "You" } else { "Assistant" };
    let top_label = if show_timestamp {
        let local = message.timestamp.with_timezone(&chrono::Local);
        format!("┌─ {} {} ", label, local.format("%H:%M"))
    } else {
        format!("┌─ {} ", label)
    };
    let top_trail_len = layout
        .wrap_width
        .saturating_sub(top_label.chars().count() + 1);
    lines.push(Line::from(Span::styled(
        format!("{}{}┐", top_label, repeat_char('─', top_trail_len)),
        border_style,
    )));

    if message.is_user {
        for chunk in wrap_message(message.content.trim(), layout.content_width) {
            lines.push(Line::from(vec![
                Span::styled("│ ", border_style),
                Span::raw("  "),
                Span::raw(chunk),
            ]));
        }
    } else {
        let prepared = PreparedContent::new(&message.content);
        for segment in prepared.segments() {
            match segment {
                RenderedSegment::Prose(prose) => {
                    for line in prose {
                        match line {
                            ProseLine::Blank => {
                                lines.push(Line::from(Span::styled("│ ", border_style)));
                            }
                            ProseLine::Text(spans) => {
                                let plain: String = spans
                                    .iter()
                                    .map(|s| match s {
                                        InlineSpan::Plain(t) | InlineSpan::Term(t) => *t,
                                    })
                                    .collect();
                                for chunk in wrap_message(&plain, layout.content_width) {
                                    let mut out =
                                        vec![Span::styled("│ ", border_style), Span::raw("  ")];
                                    out.extend(styled_spans(highlight_terms(&chunk), palette));
                                    lines.push(Line::from(out));
                                }
                            }
                        }
                    }
                }
                RenderedSegment::Code(block) => {
                    push_code_block(lines, block.lang, block.code, border_style, layout, palette);
                }
            }
        }
    }

    lines.push(Line::from(Span::styled(
        format!("└{}┘", repeat_char('─', layout.wrap_width.saturating_sub(2))),
        border_style,
    )));
    lines.push(Line::from(""));
}

pub(crate) fn draw_history(f: &mut Frame, app: &mut App, history_area: Rect) {
    let palette = app.palette();
    let history_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(history_area);
    let text_area = history_chunks[0];
    let scrollbar_area = history_chunks[1];
    let layout = BlockLayout {
        wrap_width: text_area.width as usize,
        content_width: (text_area.width as usize).saturating_sub(5),
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in &app.state().transcript {
        add_message_block(&mut lines, message, app.show_timestamps, &layout, &palette);
    }
    if app.thinking {
        lines.push(Line::from(Span::styled(
            "  Thinking... ",
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = lines.len();
    let visible = text_area.height as usize;
    let max_scroll = total_lines.saturating_sub(visible.max(1));
    app.last_max_scroll = max_scroll;
    let scroll_pos = app.scroll_line().min(max_scroll);
    let end = (scroll_pos + visible).min(total_lines);
    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(scroll_pos)
        .take(end - scroll_pos)
        .collect();

    f.render_widget(Paragraph::new(visible_lines), text_area);

    let mut scrollbar_state = ScrollbarState::default()
        .position(scroll_pos)
        .content_length(total_lines);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .thumb_symbol("█")
        .thumb_style(Style::default().fg(palette.code))
        .track_symbol(Some("│"));
    f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
}

/// Gate messages and prompt suggestions for the selected category.
pub(crate) fn draw_welcome(f: &mut Frame, app: &mut App, area: Rect) {
    let palette = app.palette();
    let state = app.state();
    let dim = Style::default().fg(palette.dim);
    let mut lines = vec![Line::from("")];

    let category = state
        .category
        .as_deref()
        .and_then(|id| state.settings.category(id));
    match (&state.user, category) {
        (None, _) => {
            lines.push(Line::from(Span::styled(
                "Sign in to start chatting",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled("Alt+A opens the account form", dim)));
        }
        (Some(user), None) => {
            lines.push(Line::from(Span::styled(
                format!("Welcome, {}", user.name),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "Choose a category before chatting (Ctrl+K)",
                dim,
            )));
        }
        (Some(_), Some(category)) => {
            lines.push(Line::from(Span::styled(
                category.name.clone(),
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            if !category.description.is_empty() {
                lines.push(Line::from(Span::styled(category.description.clone(), dim)));
            }
            let prompts: Vec<_> = state.settings.prompts_for(&category.id).collect();
            if !prompts.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Try one (Tab to insert):", dim)));
                let selected = app.selected_suggestion % prompts.len();
                for (i, prompt) in prompts.iter().enumerate() {
                    let style = if i == selected {
                        Style::default().fg(palette.surface).bg(palette.accent)
                    } else {
                        Style::default().fg(palette.text)
                    };
                    lines.push(Line::from(Span::styled(format!(" {} ", prompt.text), style)));
                }
            }
        }
    }

    let height = lines.len() as u16;
    let centered = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: area.width,
        height: height.min(area.height),
    };
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered,
    );
}
