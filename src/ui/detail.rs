//! Detail overlay for the selected report.

use crate::app::App;
use crate::theme::{Category, SourceKind};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::helpers::{centered_rect, relative_time};

pub(super) fn render(f: &mut Frame, app: &App) {
    let Some(item) = app.selected_item() else {
        return;
    };
    let area = centered_rect(70, 60, f.area());
    f.render_widget(Clear, area);

    let category = Category::parse(item.category.as_deref());
    let source = item.source.as_ref();
    let kind = SourceKind::parse(source.and_then(|s| s.name.as_deref()));
    let location_name = item
        .locations
        .as_ref()
        .and_then(|loc| loc.name.as_deref())
        .unwrap_or("Unknown location");
    let age = relative_time(source.and_then(|s| s.published_at.as_deref()));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", category.glyph(), category.label()),
                Style::default()
                    .fg(category.color())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{} {}", kind.glyph(), age),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            location_name.to_string(),
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
    ];
    for text_line in item.context.lines() {
        lines.push(Line::from(text_line.to_string()));
    }
    if let Some(analysis) = item.analysis.as_deref().filter(|a| !a.trim().is_empty()) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Analysis",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        for text_line in analysis.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
    }
    if let Some(url) = source.and_then(|s| s.url.as_deref()) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            url.to_string(),
            Style::default().fg(Color::Blue),
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Report — [o]pen source [Esc] close ")
            .borders(Borders::ALL),
    );
    f.render_widget(paragraph, area);
}
