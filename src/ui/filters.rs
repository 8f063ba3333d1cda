//! Filter panel overlay: the editable query draft.

use crate::app::{App, FilterEditor, FilterRow, FILTER_ROWS};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::helpers::centered_rect;
use super::input::picker_options;

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    if let Some(FilterEditor::Picker { row, cursor }) = &app.filter_editor {
        render_picker(f, app, *row, *cursor, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(FILTER_ROWS.len() + 3);
    for (index, row) in FILTER_ROWS.iter().enumerate() {
        let label = row_label(*row);
        let value = match &app.filter_editor {
            Some(FilterEditor::Text {
                row: editing_row,
                buffer,
            }) if editing_row == row => format!("{}▏", buffer),
            _ => row_value(app, *row),
        };
        let style = if index == app.filter_cursor {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", label), style.fg(Color::Cyan)),
            Span::styled(value, style),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "[Enter] edit  [x] clear  [a]pply  [r]eset  [Esc] close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn render_picker(f: &mut Frame, app: &App, row: FilterRow, cursor: usize, area: ratatui::layout::Rect) {
    let options = picker_options(app, row);
    let chosen = match row {
        FilterRow::Locations => &app.draft.locations,
        FilterRow::Sources => &app.draft.sources,
        FilterRow::Categories => &app.draft.categories,
        _ => return,
    };

    let visible_rows = area.height.saturating_sub(3) as usize;
    let offset = cursor.saturating_sub(visible_rows.saturating_sub(1));
    let mut lines: Vec<Line> = Vec::with_capacity(visible_rows + 1);

    if options.is_empty() {
        lines.push(Line::from(Span::styled(
            "No options loaded yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (index, option) in options.iter().enumerate().skip(offset).take(visible_rows) {
        let mark = if chosen.contains(option) { "[x]" } else { "[ ]" };
        let style = if index == cursor {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{} {}", mark, option),
            style,
        )));
    }
    lines.push(Line::from(Span::styled(
        "[Space] toggle  [Enter/Esc] done",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", row_label(row)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn row_label(row: FilterRow) -> &'static str {
    match row {
        FilterRow::Search => "Search",
        FilterRow::Locations => "Locations",
        FilterRow::Sources => "Sources",
        FilterRow::Categories => "Categories",
        FilterRow::StartDate => "From",
        FilterRow::EndDate => "To",
        FilterRow::Radius => "Radius",
    }
}

fn row_value(app: &App, row: FilterRow) -> String {
    match row {
        FilterRow::Search => app.draft.search_terms.clone(),
        FilterRow::Locations => app.draft.locations.join(", "),
        FilterRow::Sources => app.draft.sources.join(", "),
        FilterRow::Categories => app.draft.categories.join(", "),
        FilterRow::StartDate => app
            .draft
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        FilterRow::EndDate => app
            .draft
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        FilterRow::Radius => match app.draft.point {
            Some(point) => format!(
                "{} km around {:.4}, {:.4}",
                app.draft.radius_km, point.lat, point.lng
            ),
            None => format!("{} km (no point picked — press p on the map)", app.draft.radius_km),
        },
    }
}
