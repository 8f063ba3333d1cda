//! Report feed panel: the scrollable, incrementally loaded item list.

use crate::app::{App, Focus};
use crate::theme::{Category, SourceKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::helpers::{relative_time, truncate_text};

pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let page = app.sync.page();
    let title = format!(" Reports {}/{} ", app.sync.items().len(), page.total);
    let border_style = if app.focus == Focus::Feed {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    // The input layer and the tail-sentinel trigger both need to know
    // how many rows fit; record it here where the size is authoritative.
    app.list_viewport = inner.height as usize;

    if app.sync.items().is_empty() {
        let text = if app.sync.is_loading() {
            "Loading reports..."
        } else {
            "No data for this filters."
        };
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::with_capacity(inner.height as usize);
    let visible = app
        .sync
        .items()
        .iter()
        .enumerate()
        .skip(app.list_offset)
        .take(inner.height as usize);

    for (index, item) in visible {
        let category = Category::parse(item.category.as_deref());
        let source = item.source.as_ref();
        let kind = SourceKind::parse(source.and_then(|s| s.name.as_deref()));
        let age = relative_time(source.and_then(|s| s.published_at.as_deref()));

        let is_cursor = app.focus == Focus::Feed && index == app.list_cursor;
        let is_selected = app.selected_id.as_deref() == Some(item.id.as_str());

        let mut row_style = Style::default();
        if is_cursor {
            row_style = row_style.add_modifier(Modifier::REVERSED);
        }
        if is_selected {
            row_style = row_style.add_modifier(Modifier::BOLD);
        }

        let prefix_width = 2 + 2 + age.len() + 3; // glyphs, age, separators
        let body = truncate_text(
            item.context.lines().next().unwrap_or(""),
            width.saturating_sub(prefix_width),
        );

        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", category.glyph()),
                row_style.fg(category.color()),
            ),
            Span::styled(format!("{} ", kind.glyph()), row_style),
            Span::styled(body, row_style),
            Span::styled(format!("  {}", age), row_style.fg(Color::DarkGray)),
        ]));
    }

    // Tail row: loading indicator or end-of-feed marker, shown when the
    // sentinel position is inside the viewport.
    if lines.len() < inner.height as usize {
        if app.sync.is_loading() {
            lines.push(Line::from(Span::styled(
                "Loading more...",
                Style::default().fg(Color::DarkGray),
            )));
        } else if !page.has_more {
            lines.push(Line::from(Span::styled(
                "No more items",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}
