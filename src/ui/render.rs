//! Render functions for the TUI.
//!
//! Lays out the dashboard panels and dispatches to the widget modules.

use crate::app::{App, Focus};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{chat, detail, feed_list, filters, map, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 70;
pub(super) const MIN_HEIGHT: u16 = 16;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_main_panels(f, app, rows[0]);
    status::render(f, app, rows[1]);

    // Overlays, painted over the dashboard when active.
    if app.detail_open && app.selected_item().is_some() {
        detail::render(f, app);
    }
    if app.focus == Focus::Filters {
        filters::render(f, app);
    }
}

/// Render the dashboard panels: map and chat on the left, the report
/// feed on the right.
fn render_main_panels(f: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(10)])
        .split(columns[0]);

    map::render(f, app, left[0]);
    chat::render(f, app, left[1]);
    feed_list::render(f, app, columns[1]);
}
