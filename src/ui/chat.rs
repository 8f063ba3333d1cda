//! Chat panel: the assistant transcript and the input line.

use crate::app::{App, Focus};
use crate::chat::Role;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 4 {
        return;
    }

    let border_style = if app.focus == Focus::Chat {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(" Assistant — Ctrl+L clear ")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    render_transcript(f, app, rows[0]);
    render_input_line(f, app, rows[1]);
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let width = area.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for message in app.chat.messages() {
        let (prefix, style) = match message.role {
            Role::User => ("you: ", Style::default().fg(Color::Green)),
            Role::Api => ("bot: ", Style::default().fg(Color::Gray)),
        };
        // Pre-wrap so the scroll offset counts display rows, not
        // messages.
        for (i, wrapped) in wrap_text(&message.text, width.saturating_sub(prefix.len()))
            .into_iter()
            .enumerate()
        {
            let lead = if i == 0 { prefix } else { "     " };
            lines.push(Line::from(vec![
                Span::styled(lead, style.add_modifier(Modifier::BOLD)),
                Span::styled(wrapped, style),
            ]));
        }
    }
    if app.chat_sending {
        lines.push(Line::from(Span::styled(
            "bot is typing...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    // Pin to the bottom, offset by the user's scroll position.
    let height = area.height as usize;
    let bottom = lines.len().saturating_sub(app.chat_scroll);
    let start = bottom.saturating_sub(height);
    let visible: Vec<Line> = lines
        .into_iter()
        .skip(start)
        .take(height)
        .collect();

    f.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), area);
}

fn render_input_line(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.focus == Focus::Chat {
        (
            format!("> {}▏", app.chat_input),
            Style::default().fg(Color::White),
        )
    } else {
        (
            "> Tab here to ask a question".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

/// Greedy word wrap by character count.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut out = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}
