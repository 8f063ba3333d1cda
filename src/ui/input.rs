//! Input handling for the TUI.
//!
//! Dispatches keyboard input by capture priority: an active filter
//! editor swallows everything, then the focused panel's bindings apply.

use crate::api::DEFAULT_RADIUS_KM;
use crate::app::{App, AppEvent, FilterEditor, FilterRow, Focus, SelectionChange, FILTER_ROWS};
use crate::chat::Role;
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{spawn_apply, spawn_chat, spawn_polygon_lookup};
use super::Action;

/// Fraction of the viewport span a single pan keystroke moves.
const PAN_STEP_DIVISOR: f64 = 4.0;
/// Fraction of the viewport span a single crosshair keystroke moves.
const CROSSHAIR_STEP_DIVISOR: f64 = 20.0;

/// Main input dispatch function.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // An open filter editor captures all keys.
    if app.filter_editor.is_some() {
        handle_filter_editor_input(app, code);
        return Ok(Action::Continue);
    }

    // The detail overlay captures dismissal keys but lets list
    // navigation through so the analyst can step between reports.
    if app.detail_open {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                app.clear_selection();
                return Ok(Action::Continue);
            }
            KeyCode::Char('o') => {
                open_selected_source(app);
                return Ok(Action::Continue);
            }
            _ => {}
        }
    }

    // Chat focus: printable characters belong to the input box, so the
    // global bindings only apply to control keys.
    if app.focus == Focus::Chat {
        return handle_chat_input(app, code, modifiers, event_tx).await;
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return Ok(Action::Continue);
        }
        KeyCode::Esc if app.selected_id.is_some() => {
            app.clear_selection();
            return Ok(Action::Continue);
        }
        // Apply and reset work from any panel.
        KeyCode::Char('a') => {
            spawn_apply(app, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char('r') => {
            app.draft = Default::default();
            spawn_apply(app, event_tx);
            app.set_status("Filters reset");
            return Ok(Action::Continue);
        }
        _ => {}
    }

    match app.focus {
        Focus::Map => handle_map_input(app, code, event_tx),
        Focus::Feed => handle_feed_input(app, code, event_tx),
        Focus::Filters => handle_filters_input(app, code),
        Focus::Chat => unreachable!("chat focus handled above"),
    }

    Ok(Action::Continue)
}

// ============================================================================
// Map Panel
// ============================================================================

fn handle_map_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    let (lat_half, lng_half) = app.map_span();

    if app.picking_mode {
        let lat_step = lat_half / CROSSHAIR_STEP_DIVISOR;
        let lng_step = lng_half / CROSSHAIR_STEP_DIVISOR;
        match code {
            KeyCode::Up | KeyCode::Char('k') => app.crosshair.0 += lat_step,
            KeyCode::Down | KeyCode::Char('j') => app.crosshair.0 -= lat_step,
            KeyCode::Left | KeyCode::Char('h') => app.crosshair.1 -= lng_step,
            KeyCode::Right | KeyCode::Char('l') => app.crosshair.1 += lng_step,
            KeyCode::Enter => app.confirm_pick(),
            KeyCode::Esc | KeyCode::Char('p') => {
                app.picking_mode = false;
                app.set_status("Picking cancelled");
            }
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Up | KeyCode::Char('k') => app.map_center.0 += lat_half / PAN_STEP_DIVISOR,
        KeyCode::Down | KeyCode::Char('j') => app.map_center.0 -= lat_half / PAN_STEP_DIVISOR,
        KeyCode::Left | KeyCode::Char('h') => app.map_center.1 -= lng_half / PAN_STEP_DIVISOR,
        KeyCode::Right | KeyCode::Char('l') => app.map_center.1 += lng_half / PAN_STEP_DIVISOR,
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.map_zoom = (app.map_zoom + 1).min(18);
        }
        KeyCode::Char('-') => {
            app.map_zoom = app.map_zoom.saturating_sub(1).max(2);
        }
        KeyCode::Char('p') => {
            app.picking_mode = true;
            app.crosshair = app.map_center;
            app.set_status("Pick a point: arrows move, Enter confirms, Esc cancels");
        }
        KeyCode::Char('n') => select_marker(app, 1, event_tx),
        KeyCode::Char('N') => select_marker(app, -1, event_tx),
        KeyCode::Enter => {
            // Toggle the selection of the marker nearest the center.
            if let Some(index) = nearest_marker(app) {
                let id = app.sync.items()[index].id.clone();
                toggle_and_lookup(app, &id, event_tx);
            }
        }
        _ => {}
    }
}

/// Step the selection through the marker list in `direction`.
fn select_marker(app: &mut App, direction: i64, event_tx: &mpsc::Sender<AppEvent>) {
    let markers = app.sync.markers();
    if markers.is_empty() {
        app.set_status("No located reports on the map");
        return;
    }
    let current = app
        .selected_id
        .as_deref()
        .and_then(|id| app.sync.index_of(id))
        .and_then(|item_index| markers.iter().position(|m| m.item_index == item_index));
    let next = match current {
        Some(pos) => (pos as i64 + direction).rem_euclid(markers.len() as i64) as usize,
        None => 0,
    };
    let id = app.sync.items()[markers[next].item_index].id.clone();
    // Direct selection, not a toggle: stepping onto the already-selected
    // marker keeps it selected.
    if app.selected_id.as_deref() != Some(id.as_str()) {
        toggle_and_lookup(app, &id, event_tx);
    }
}

fn nearest_marker(app: &App) -> Option<usize> {
    let (clat, clng) = app.map_center;
    app.sync
        .markers()
        .iter()
        .min_by(|a, b| {
            let da = (a.lat - clat).powi(2) + (a.lng - clng).powi(2);
            let db = (b.lat - clat).powi(2) + (b.lng - clng).powi(2);
            da.total_cmp(&db)
        })
        .map(|m| m.item_index)
}

// ============================================================================
// Feed Panel
// ============================================================================

fn handle_feed_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.list_nav_up(),
        KeyCode::Down | KeyCode::Char('j') => app.list_nav_down(),
        KeyCode::Home | KeyCode::Char('g') => {
            app.list_cursor = 0;
            app.list_offset = 0;
        }
        KeyCode::End | KeyCode::Char('G') => {
            let len = app.sync.items().len();
            app.list_cursor = len.saturating_sub(1);
            app.clamp_list_cursor();
        }
        KeyCode::Enter => {
            if let Some(item) = app.sync.items().get(app.list_cursor) {
                let id = item.id.clone();
                toggle_and_lookup(app, &id, event_tx);
            }
        }
        KeyCode::Char('o') => open_selected_source(app),
        _ => {}
    }
}

/// Toggle selection and, when a new item with a location id came in,
/// start the precise geometry lookup.
fn toggle_and_lookup(app: &mut App, id: &str, event_tx: &mpsc::Sender<AppEvent>) {
    if let SelectionChange::Selected {
        location_id: Some(location_id),
    } = app.toggle_selection(id)
    {
        spawn_polygon_lookup(app, id.to_string(), location_id, event_tx);
    }
}

/// Open the selected report's source URL in the system browser.
fn open_selected_source(app: &mut App) {
    let url = app
        .selected_item()
        .or_else(|| app.sync.items().get(app.list_cursor))
        .and_then(|item| item.source.as_ref())
        .and_then(|source| source.url.clone());
    match url {
        Some(url) => {
            if let Err(e) = open::that(&url) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opened in browser");
            }
        }
        None => app.set_status("Report has no source URL"),
    }
}

// ============================================================================
// Filter Panel
// ============================================================================

fn handle_filters_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.filter_cursor = app.filter_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.filter_cursor = (app.filter_cursor + 1).min(FILTER_ROWS.len() - 1);
        }
        KeyCode::Enter => open_filter_editor(app),
        KeyCode::Char('x') => clear_filter_row(app),
        KeyCode::Esc => app.focus = Focus::Feed,
        _ => {}
    }
}

fn open_filter_editor(app: &mut App) {
    let row = FILTER_ROWS[app.filter_cursor];
    app.filter_editor = Some(match row {
        FilterRow::Search => FilterEditor::Text {
            row,
            buffer: app.draft.search_terms.clone(),
        },
        FilterRow::StartDate => FilterEditor::Text {
            row,
            buffer: format_date(app.draft.start_date),
        },
        FilterRow::EndDate => FilterEditor::Text {
            row,
            buffer: format_date(app.draft.end_date),
        },
        FilterRow::Radius => FilterEditor::Text {
            row,
            buffer: app.draft.radius_km.to_string(),
        },
        FilterRow::Locations | FilterRow::Sources | FilterRow::Categories => {
            FilterEditor::Picker { row, cursor: 0 }
        }
    });
}

/// Clear one filter row back to its default.
fn clear_filter_row(app: &mut App) {
    match FILTER_ROWS[app.filter_cursor] {
        FilterRow::Search => app.draft.search_terms.clear(),
        FilterRow::Locations => app.draft.locations.clear(),
        FilterRow::Sources => app.draft.sources.clear(),
        FilterRow::Categories => app.draft.categories.clear(),
        FilterRow::StartDate => app.draft.start_date = None,
        FilterRow::EndDate => app.draft.end_date = None,
        FilterRow::Radius => {
            app.draft.radius_km = DEFAULT_RADIUS_KM;
            app.draft.point = None;
        }
    }
}

fn handle_filter_editor_input(app: &mut App, code: KeyCode) {
    let Some(editor) = app.filter_editor.take() else {
        return;
    };
    match editor {
        FilterEditor::Text { row, mut buffer } => match code {
            KeyCode::Enter => commit_text_edit(app, row, &buffer),
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                buffer.pop();
                app.filter_editor = Some(FilterEditor::Text { row, buffer });
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                app.filter_editor = Some(FilterEditor::Text { row, buffer });
            }
            _ => app.filter_editor = Some(FilterEditor::Text { row, buffer }),
        },
        FilterEditor::Picker { row, mut cursor } => {
            let options_len = picker_options(app, row).len();
            match code {
                KeyCode::Enter | KeyCode::Esc => {}
                KeyCode::Up | KeyCode::Char('k') => {
                    cursor = cursor.saturating_sub(1);
                    app.filter_editor = Some(FilterEditor::Picker { row, cursor });
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if options_len > 0 {
                        cursor = (cursor + 1).min(options_len - 1);
                    }
                    app.filter_editor = Some(FilterEditor::Picker { row, cursor });
                }
                KeyCode::Char(' ') => {
                    toggle_picker_option(app, row, cursor);
                    app.filter_editor = Some(FilterEditor::Picker { row, cursor });
                }
                _ => app.filter_editor = Some(FilterEditor::Picker { row, cursor }),
            }
        }
    }
}

fn commit_text_edit(app: &mut App, row: FilterRow, buffer: &str) {
    let trimmed = buffer.trim();
    match row {
        FilterRow::Search => app.draft.search_terms = trimmed.to_string(),
        FilterRow::StartDate => match parse_date_field(trimmed) {
            Ok(date) => app.draft.start_date = date,
            Err(msg) => app.set_status(msg),
        },
        FilterRow::EndDate => match parse_date_field(trimmed) {
            Ok(date) => app.draft.end_date = date,
            Err(msg) => app.set_status(msg),
        },
        FilterRow::Radius => {
            if trimmed.is_empty() {
                app.draft.radius_km = DEFAULT_RADIUS_KM;
            } else {
                match trimmed.parse::<f64>() {
                    Ok(radius) if radius > 0.0 && radius.is_finite() => {
                        app.draft.radius_km = radius;
                    }
                    _ => app.set_status("Radius must be a positive number"),
                }
            }
        }
        _ => {}
    }
}

fn parse_date_field(input: &str) -> Result<Option<NaiveDate>, &'static str> {
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| "Dates must be YYYY-MM-DD")
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Options shown by the picker for a multi-valued filter row.
pub(super) fn picker_options(app: &App, row: FilterRow) -> Vec<String> {
    match row {
        FilterRow::Locations => {
            if app.filter_options.locations.is_empty() {
                app.filter_options.areas.clone()
            } else {
                app.filter_options.locations.clone()
            }
        }
        FilterRow::Sources => app.filter_options.sources.clone(),
        FilterRow::Categories => {
            // Category filters ride the `type` parameter and enumerate
            // from the types list.
            app.filter_options.types.clone()
        }
        _ => Vec::new(),
    }
}

fn toggle_picker_option(app: &mut App, row: FilterRow, cursor: usize) {
    let options = picker_options(app, row);
    let Some(value) = options.get(cursor) else {
        return;
    };
    let list = match row {
        FilterRow::Locations => &mut app.draft.locations,
        FilterRow::Sources => &mut app.draft.sources,
        FilterRow::Categories => &mut app.draft.categories,
        _ => return,
    };
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.clone());
    }
}

// ============================================================================
// Chat Panel
// ============================================================================

async fn handle_chat_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Esc => app.focus = Focus::Feed,
        KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.chat.clear().await?;
            app.chat_scroll = 0;
            app.set_status("Chat history cleared");
        }
        KeyCode::Up => app.chat_scroll = app.chat_scroll.saturating_add(1),
        KeyCode::Down => app.chat_scroll = app.chat_scroll.saturating_sub(1),
        KeyCode::Backspace => {
            app.chat_input.pop();
        }
        KeyCode::Enter => {
            let message = app.chat_input.trim().to_string();
            if message.is_empty() {
                return Ok(Action::Continue);
            }
            if app.chat_sending {
                app.set_status("Waiting for the previous reply");
                return Ok(Action::Continue);
            }
            app.chat.push(Role::User, message.clone()).await?;
            app.chat_input.clear();
            app.chat_scroll = 0;
            app.chat_sending = true;
            spawn_chat(app, message, event_tx);
        }
        KeyCode::Char(c) => app.chat_input.push(c),
        _ => {}
    }
    Ok(Action::Continue)
}
