//! Shared UI utilities: background task spawners and text formatting.

use crate::api::ApiClient;
use crate::app::{App, AppEvent};
use crate::feed::ApplyOutcome;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthChar;

// ============================================================================
// Background Task Spawners
// ============================================================================

/// Spawn the five-way apply fetch for the current filter draft.
///
/// The synchronizer is armed first so the generation travels with the
/// spawned task; a later apply invalidates this one's completion.
pub(super) fn spawn_apply(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let filters = app.draft.clone();
    let generation = app.sync.begin_apply(filters.clone());
    let api = app.api.clone();
    let limit = app.config.page_limit;
    let tx = event_tx.clone();

    app.set_status("Loading reports...");
    tracing::debug!(generation, "Spawning filter apply");

    tokio::spawn(async move {
        let (items, total, category_counts, source_counts, location_counts) = tokio::join!(
            api.fetch_page(&filters, 0, limit),
            api.fetch_news_count(&filters),
            api.fetch_category_counts(&filters),
            api.fetch_source_counts(&filters),
            api.fetch_location_counts(&filters),
        );
        let outcome = ApplyOutcome {
            items: items.map_err(|e| e.to_string()),
            total: total.map_err(|e| e.to_string()),
            category_counts: category_counts.map_err(|e| e.to_string()),
            source_counts: source_counts.map_err(|e| e.to_string()),
            location_counts: location_counts.map_err(|e| e.to_string()),
        };
        let event = AppEvent::ApplyCompleted {
            generation,
            outcome,
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send apply result (receiver dropped)");
        }
    });
}

/// Fire the incremental page fetch when the tail sentinel says so.
pub(super) fn maybe_spawn_load_more(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some((generation, page)) = app.poll_tail_trigger() else {
        return;
    };
    let api = app.api.clone();
    let filters = app.sync.filters().clone();
    let limit = app.config.page_limit;
    let tx = event_tx.clone();

    app.needs_redraw = true;
    tracing::debug!(generation, page, "Spawning incremental page fetch");

    tokio::spawn(async move {
        let result = api
            .fetch_page(&filters, page, limit)
            .await
            .map_err(|e| e.to_string());
        let event = AppEvent::PageLoaded {
            generation,
            page,
            result,
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send page result (receiver dropped)");
        }
    });
}

/// Load the enumerated filter option lists once at startup.
pub(super) fn spawn_filter_options(api: ApiClient, event_tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let options = api.fetch_filter_options().await;
        if event_tx
            .send(AppEvent::FilterOptionsLoaded(options))
            .await
            .is_err()
        {
            tracing::warn!("Failed to send filter options (receiver dropped)");
        }
    });
}

/// Look up precise polygon geometry for the selected item.
pub(super) fn spawn_polygon_lookup(
    app: &App,
    item_id: String,
    location_id: String,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api
            .fetch_location_polygon(&location_id)
            .await
            .map_err(|e| e.to_string())
            .map(|rings| rings.map(|rings| crate::feed::PolygonOverlay { rings }));
        let event = AppEvent::GeometryLoaded { item_id, result };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send polygon geometry (receiver dropped)");
        }
    });
}

/// Send one chat message to the assistant endpoint.
pub(super) fn spawn_chat(app: &App, message: String, event_tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let result = api.send_chat(&message).await.map_err(|e| e.to_string());
        if tx.send(AppEvent::ChatReplied { result }).await.is_err() {
            tracing::warn!("Failed to send chat reply (receiver dropped)");
        }
    });
}

// ============================================================================
// Text Formatting
// ============================================================================

/// Truncate to a display width, appending an ellipsis when cut.
/// Width-aware so double-width glyphs never overflow the column.
pub(super) fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut result = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        width += ch_width;
        result.push(ch);
    }
    result
}

/// Human-readable age of a report's raw publication timestamp.
///
/// The wire format is not guaranteed; RFC 3339 and a bare
/// `YYYY-MM-DD HH:MM:SS` are both accepted, anything else degrades to
/// "Unknown Time" rather than rejecting the item.
pub(super) fn relative_time(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown Time".to_string();
    };
    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        });
    let Ok(published) = parsed else {
        return "Unknown Time".to_string();
    };

    let elapsed = chrono::Utc::now().signed_duration_since(published);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else if minutes < 60 * 24 * 7 {
        format!("{}d ago", minutes / (60 * 24))
    } else {
        published.format("%Y-%m-%d").to_string()
    }
}

/// Centered overlay rect sized as a percentage of the containing area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate_text("short", 20), "short");
        assert_eq!(truncate_text("abcdefgh", 5), "abcd…");
    }

    #[test]
    fn unparseable_timestamp_degrades() {
        assert_eq!(relative_time(None), "Unknown Time");
        assert_eq!(relative_time(Some("not a date")), "Unknown Time");
    }

    #[test]
    fn recent_timestamps_are_relative() {
        let now = chrono::Utc::now() - chrono::Duration::minutes(5);
        let formatted = relative_time(Some(&now.to_rfc3339()));
        assert_eq!(formatted, "5m ago");
    }

    #[test]
    fn old_timestamps_fall_back_to_date() {
        let old = chrono::Utc::now() - chrono::Duration::days(60);
        let formatted = relative_time(Some(&old.to_rfc3339()));
        assert!(formatted.starts_with(&old.format("%Y").to_string()));
    }
}
