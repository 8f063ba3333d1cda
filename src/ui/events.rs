//! Application event handling.
//!
//! Processes background task completions: apply and page fetches,
//! filter option loads, polygon lookups, and chat replies.

use crate::app::{App, AppEvent};
use crate::chat::Role;

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::FilterOptionsLoaded(options) => {
            tracing::debug!(
                areas = options.areas.len(),
                locations = options.locations.len(),
                "Filter options loaded"
            );
            app.filter_options = options;
        }

        AppEvent::ApplyCompleted {
            generation,
            outcome,
        } => {
            let Some(failed) = app.sync.complete_apply(generation, outcome) else {
                return; // superseded by a newer apply
            };
            if failed.is_empty() {
                app.set_status(format!("{} reports loaded", app.sync.page().total));
            } else {
                app.set_status(format!("Failed to load: {}", failed.join(", ")));
            }
            // The collection was replaced; the cursor and the selection
            // may now point at nothing.
            app.list_cursor = 0;
            app.list_offset = 0;
            app.tail_armed = true;
            if let Some(id) = app.selected_id.clone() {
                if app.sync.item_by_id(&id).is_none() {
                    app.clear_selection();
                }
            }
        }

        AppEvent::PageLoaded {
            generation,
            page,
            result,
        } => {
            let failed = result.is_err();
            app.sync.complete_load_more(generation, page, result);
            if failed {
                app.set_status("Failed to load more reports");
            }
        }

        AppEvent::GeometryLoaded { item_id, result } => {
            // Only relevant while this item is still the selection.
            if app.selected_id.as_deref() != Some(item_id.as_str()) {
                return;
            }
            match result {
                Ok(Some(overlay)) => app.sync.set_selection_overlay(Some(overlay)),
                Ok(None) => {
                    tracing::debug!(item_id = %item_id, "Location has no polygon geometry");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Polygon lookup failed");
                    app.set_status("Failed to load area geometry");
                }
            }
        }

        AppEvent::ChatReplied { result } => {
            app.chat_sending = false;
            app.chat_scroll = 0;
            let text = match result {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, "Chat request failed");
                    app.set_status("Chat request failed");
                    "Request failed. Please try again.".to_string()
                }
            };
            if let Err(e) = app.chat.push(Role::Api, text).await {
                tracing::error!(error = %e, "Failed to persist chat reply");
                app.set_status("Failed to save chat reply");
            }
        }
    }
}
