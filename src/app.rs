//! Central application state and background-task events.

use crate::api::{ApiClient, FeedItem, FilterOptions, FilterSelection, PickedPoint};
use crate::chat::ChatHistory;
use crate::config::Config;
use crate::feed::{ApplyOutcome, FeedSynchronizer, PolygonOverlay};
use crate::storage::Database;
use std::borrow::Cow;
use tokio::time::Instant;

// ============================================================================
// Focus and Editing Modes
// ============================================================================

/// Which panel owns keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Map,
    Feed,
    Filters,
    Chat,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Map => Focus::Feed,
            Focus::Feed => Focus::Filters,
            Focus::Filters => Focus::Chat,
            Focus::Chat => Focus::Map,
        }
    }
}

/// Rows of the filter panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRow {
    Search,
    Locations,
    Sources,
    Categories,
    StartDate,
    EndDate,
    Radius,
}

/// All filter rows in cursor order.
pub const FILTER_ROWS: [FilterRow; 7] = [
    FilterRow::Search,
    FilterRow::Locations,
    FilterRow::Sources,
    FilterRow::Categories,
    FilterRow::StartDate,
    FilterRow::EndDate,
    FilterRow::Radius,
];

/// An in-progress edit of one filter row.
#[derive(Debug, Clone)]
pub enum FilterEditor {
    /// Free-text entry (search term, dates, radius).
    Text { row: FilterRow, buffer: String },
    /// Multi-select picker over an enumerated option list.
    Picker { row: FilterRow, cursor: usize },
}

// ============================================================================
// Selection
// ============================================================================

/// Outcome of a selection toggle, telling the caller what to spawn.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectionChange {
    /// Selection cleared (same item clicked twice).
    Cleared,
    /// A new item is selected; carries its location id when a precise
    /// polygon lookup should follow.
    Selected { location_id: Option<String> },
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Events from spawned background tasks, drained by the event loop.
pub enum AppEvent {
    /// Enumerated filter option lists finished loading.
    FilterOptionsLoaded(FilterOptions),
    /// The five-way apply fetch settled.
    ApplyCompleted {
        generation: u64,
        outcome: ApplyOutcome,
    },
    /// An incremental page fetch settled.
    PageLoaded {
        generation: u64,
        page: u32,
        result: Result<Vec<FeedItem>, String>,
    },
    /// The by-location-id polygon lookup settled.
    GeometryLoaded {
        item_id: String,
        result: Result<Option<PolygonOverlay>, String>,
    },
    /// The chat endpoint replied (or failed).
    ChatReplied { result: Result<String, String> },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state. Mutated only on the UI task; background
/// work reports in through [`AppEvent`].
pub struct App {
    pub db: Database,
    pub api: ApiClient,
    pub config: Config,

    /// The feed core: items, pagination, projections.
    pub sync: FeedSynchronizer,

    // Filters
    pub filter_options: FilterOptions,
    /// Draft selection being edited; applied wholesale on Apply.
    pub draft: FilterSelection,
    pub filter_cursor: usize,
    pub filter_editor: Option<FilterEditor>,

    // Selection
    /// Id of the selected item; shared between list and map.
    pub selected_id: Option<String>,
    pub detail_open: bool,

    // Feed list
    pub list_cursor: usize,
    pub list_offset: usize,
    /// Rows visible in the list viewport, updated during render.
    pub list_viewport: usize,
    /// Tail sentinel trigger: armed while the sentinel is out of view,
    /// fires load-more once when it scrolls in.
    pub tail_armed: bool,

    // Map
    pub map_center: (f64, f64),
    pub map_zoom: u8,
    pub picking_mode: bool,
    /// Crosshair position while picking.
    pub crosshair: (f64, f64),

    // Chat
    pub chat: ChatHistory,
    pub chat_input: String,
    pub chat_sending: bool,
    pub chat_scroll: usize,

    // UI plumbing
    pub focus: Focus,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(db: Database, api: ApiClient, config: Config, chat: ChatHistory) -> Self {
        let center = (config.map_center_lat, config.map_center_lng);
        let zoom = config.map_zoom;
        Self {
            db,
            api,
            config,
            sync: FeedSynchronizer::new(),
            filter_options: FilterOptions::default(),
            draft: FilterSelection::default(),
            filter_cursor: 0,
            filter_editor: None,
            selected_id: None,
            detail_open: false,
            list_cursor: 0,
            list_offset: 0,
            list_viewport: 0,
            tail_armed: true,
            map_center: center,
            map_zoom: zoom,
            picking_mode: false,
            crosshair: center,
            chat,
            chat_input: String::new(),
            chat_sending: false,
            chat_scroll: 0,
            focus: Focus::Feed,
            status_message: None,
            needs_redraw: true,
        }
    }

    // ========================================================================
    // Status Messages
    // ========================================================================

    /// Set status message (auto-expires after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Toggle selection of the item with the given id.
    ///
    /// Selecting the already-selected item clears the selection;
    /// selecting a different item replaces it. The caller spawns the
    /// polygon lookup when a location id comes back.
    pub fn toggle_selection(&mut self, id: &str) -> SelectionChange {
        if self.selected_id.as_deref() == Some(id) {
            self.clear_selection();
            return SelectionChange::Cleared;
        }

        self.selected_id = Some(id.to_string());
        self.detail_open = true;
        self.recenter_on_selection();

        let location_id = self
            .sync
            .item_by_id(id)
            .and_then(|item| item.locations.as_ref())
            .and_then(|loc| loc.location_id.clone());
        SelectionChange::Selected { location_id }
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
        self.detail_open = false;
        self.sync.set_selection_overlay(None);
        self.recenter_on_selection();
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.sync.item_by_id(id))
    }

    /// Fly to the selected item's coordinates, or fall back to the
    /// configured default center and zoom when nothing (locatable) is
    /// selected.
    pub fn recenter_on_selection(&mut self) {
        match self.selected_item().and_then(|item| item.coordinates()) {
            Some((lat, lng)) => {
                self.map_center = (lat, lng);
                self.map_zoom = 15;
            }
            None => {
                self.map_center = (self.config.map_center_lat, self.config.map_center_lng);
                self.map_zoom = self.config.map_zoom;
            }
        }
    }

    // ========================================================================
    // Feed List Navigation
    // ========================================================================

    pub fn list_nav_up(&mut self) {
        self.list_cursor = self.list_cursor.saturating_sub(1);
        self.scroll_cursor_into_view();
    }

    pub fn list_nav_down(&mut self) {
        if !self.sync.items().is_empty() {
            let max = self.sync.items().len().saturating_sub(1);
            self.list_cursor = self.list_cursor.saturating_add(1).min(max);
        }
        self.scroll_cursor_into_view();
    }

    /// Clamp the cursor after the item collection changed underneath it.
    pub fn clamp_list_cursor(&mut self) {
        let len = self.sync.items().len();
        if len == 0 {
            self.list_cursor = 0;
            self.list_offset = 0;
        } else {
            self.list_cursor = self.list_cursor.min(len - 1);
        }
        self.scroll_cursor_into_view();
    }

    fn scroll_cursor_into_view(&mut self) {
        if self.list_viewport == 0 {
            return;
        }
        if self.list_cursor < self.list_offset {
            self.list_offset = self.list_cursor;
        } else if self.list_cursor >= self.list_offset + self.list_viewport {
            self.list_offset = self.list_cursor + 1 - self.list_viewport;
        }
    }

    /// Whether the tail sentinel (one virtual row past the last item)
    /// is inside the current viewport.
    pub fn tail_visible(&self) -> bool {
        let len = self.sync.items().len();
        if len == 0 || self.list_viewport == 0 {
            return false;
        }
        len <= self.list_offset + self.list_viewport
    }

    /// Fire the incremental-load trigger at most once per visibility
    /// transition of the tail sentinel. Returns the generation and page
    /// to fetch when a load should be spawned.
    pub fn poll_tail_trigger(&mut self) -> Option<(u64, u32)> {
        if !self.tail_visible() {
            self.tail_armed = true;
            return None;
        }
        if !self.tail_armed {
            return None;
        }
        // Loading gate: begin_load_more refuses while a fetch is in
        // flight or the session is exhausted.
        let armed = self.sync.begin_load_more()?;
        self.tail_armed = false;
        Some(armed)
    }

    // ========================================================================
    // Map
    // ========================================================================

    /// Half-spans of the map viewport in degrees for the current zoom.
    pub fn map_span(&self) -> (f64, f64) {
        let lat_half = 90.0 / f64::from(1u32 << self.map_zoom.min(20));
        let lng_half = 180.0 / f64::from(1u32 << self.map_zoom.min(20));
        (lat_half, lng_half)
    }

    /// Confirm the crosshair as the picked geo-radius center and leave
    /// picking mode. The coordinate is published into the filter draft,
    /// not consumed by the map.
    pub fn confirm_pick(&mut self) {
        let (lat, lng) = self.crosshair;
        self.draft.point = Some(PickedPoint { lat, lng });
        self.picking_mode = false;
        self.set_status(format!("Picked {:.4}, {:.4}", lat, lng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use tokio::time::{self, Duration};
    use url::Url;

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new(
            Url::parse("http://localhost:1/").unwrap(),
            Url::parse("http://localhost:1/").unwrap(),
            SecretString::from("test-token"),
        )
        .unwrap();
        let chat = ChatHistory::load(db.clone()).await.unwrap();
        App::new(db, api, Config::default(), chat)
    }

    fn item(id: &str, lat: f64, lng: f64) -> FeedItem {
        serde_json::from_str(&format!(
            r#"{{"_id":"{}","context":"x","locations":{{"latitude":{},"longitude":{},"location_id":"loc-{}"}}}}"#,
            id, lat, lng, id
        ))
        .unwrap()
    }

    fn seed_items(app: &mut App, items: Vec<FeedItem>) {
        let generation = app.sync.begin_apply(FilterSelection::default());
        let total = items.len() as u64;
        app.sync.complete_apply(
            generation,
            ApplyOutcome {
                items: Ok(items),
                total: Ok(total),
                category_counts: Ok(serde_json::json!({})),
                source_counts: Ok(serde_json::json!({})),
                location_counts: Ok(serde_json::json!({})),
            },
        );
    }

    #[tokio::test]
    async fn selecting_same_item_twice_clears_selection() {
        let mut app = test_app().await;
        seed_items(&mut app, vec![item("a", 31.0, 34.0)]);

        let change = app.toggle_selection("a");
        assert_eq!(
            change,
            SelectionChange::Selected {
                location_id: Some("loc-a".into())
            }
        );
        assert_eq!(app.selected_id.as_deref(), Some("a"));
        assert!(app.detail_open);

        let change = app.toggle_selection("a");
        assert_eq!(change, SelectionChange::Cleared);
        assert!(app.selected_id.is_none());
        assert!(!app.detail_open);
    }

    #[tokio::test]
    async fn selecting_b_after_a_replaces_selection() {
        let mut app = test_app().await;
        seed_items(&mut app, vec![item("a", 31.0, 34.0), item("b", 32.0, 35.0)]);

        app.toggle_selection("a");
        app.toggle_selection("b");
        assert_eq!(app.selected_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn selection_recenters_map_and_clears_back_to_default() {
        let mut app = test_app().await;
        seed_items(&mut app, vec![item("a", 33.0, 35.0)]);

        app.toggle_selection("a");
        assert_eq!(app.map_center, (33.0, 35.0));
        assert_eq!(app.map_zoom, 15);

        app.clear_selection();
        assert_eq!(
            app.map_center,
            (app.config.map_center_lat, app.config.map_center_lng)
        );
        assert_eq!(app.map_zoom, app.config.map_zoom);
    }

    #[tokio::test]
    async fn tail_trigger_fires_once_per_visibility_transition() {
        let mut app = test_app().await;
        seed_items(&mut app, vec![item("a", 31.0, 34.0), item("b", 32.0, 35.0)]);
        app.list_viewport = 10; // both items and the sentinel visible

        let first = app.poll_tail_trigger();
        assert!(first.is_some());
        // Sentinel still visible, but the trigger has fired and the
        // loading gate is active.
        assert!(app.poll_tail_trigger().is_none());

        // Completion re-opens the gate, yet the trigger stays disarmed
        // until the sentinel leaves the viewport.
        let (generation, page) = first.unwrap();
        app.sync.complete_load_more(generation, page, Ok(vec![]));
        assert!(app.poll_tail_trigger().is_none());
    }

    #[tokio::test]
    async fn confirm_pick_publishes_into_draft() {
        let mut app = test_app().await;
        app.picking_mode = true;
        app.crosshair = (31.52, 34.45);
        app.confirm_pick();

        assert!(!app.picking_mode);
        let point = app.draft.point.unwrap();
        assert!((point.lat - 31.52).abs() < 1e-9);
        assert!((point.lng - 34.45).abs() < 1e-9);
    }

    #[tokio::test]
    async fn status_expires_after_3_seconds() {
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test message");
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
