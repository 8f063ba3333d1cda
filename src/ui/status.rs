//! Status bar: transient messages, the loading indicator, and
//! focus-specific key hints.

use crate::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.sync.is_loading() {
        Cow::Borrowed("Loading...")
    } else {
        match app.focus {
            Focus::Map => {
                if app.picking_mode {
                    Cow::Borrowed("arrows move crosshair | ENTER confirm | ESC cancel")
                } else {
                    Cow::Borrowed(
                        "[hjkl]pan [+/-]zoom [p]ick point [n/N]markers [a]pply [Tab]switch [q]uit",
                    )
                }
            }
            Focus::Feed => Cow::Borrowed(
                "[j/k]navigate [Enter]select [o]pen [a]pply [r]eset [Tab]switch [q]uit",
            ),
            Focus::Filters => Cow::Borrowed("[j/k]rows [Enter]edit [x]clear [a]pply [r]eset [Esc]back"),
            Focus::Chat => Cow::Borrowed("Type a question | ENTER send | Ctrl+L clear | ESC back"),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
