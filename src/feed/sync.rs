//! Feed synchronizer: the paginated item collection and its projections.
//!
//! This is a synchronous state machine driven by begin/complete pairs.
//! The UI layer spawns the actual fetches and feeds completions back in;
//! each in-flight operation carries the generation counter it was
//! spawned under, and completions whose generation is stale relative to
//! the latest apply are discarded. That makes a slow page-1 response
//! arriving after a newer apply inert instead of a state-clobbering race.

use crate::api::{FeedItem, FilterSelection};
use crate::feed::projections::{derive_markers, derive_polygons, Marker, PolygonOverlay};
use serde_json::Value;
use std::collections::HashSet;

/// Pagination bookkeeping for the active filter session.
#[derive(Debug, Clone, Copy)]
pub struct PageState {
    /// Index of the last fetched page. 0 after an apply.
    pub page: u32,
    /// True until a fetch returns a literally empty item list.
    /// A non-empty page shorter than the requested limit does not
    /// clear it.
    pub has_more: bool,
    /// Total matching reports, from the count endpoint.
    pub total: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 0,
            has_more: true,
            total: 0,
        }
    }
}

/// Settled results of the five-way parallel apply fetch.
///
/// Each slot settles independently; errors are carried as strings so
/// the outcome can cross the task boundary. The three aggregate count
/// structures are opaque to the core and passed through to the view.
pub struct ApplyOutcome {
    pub items: Result<Vec<FeedItem>, String>,
    pub total: Result<u64, String>,
    pub category_counts: Result<Value, String>,
    pub source_counts: Result<Value, String>,
    pub location_counts: Result<Value, String>,
}

/// Owns the item collection, pagination state and derived projections.
pub struct FeedSynchronizer {
    filters: FilterSelection,
    items: Vec<FeedItem>,
    page: PageState,
    loading: bool,
    /// Bumped by every apply; identifies the active filter session.
    generation: u64,
    markers: Vec<Marker>,
    polygons: Vec<PolygonOverlay>,
    /// Precise geometry from the by-location-id lookup. Shown instead
    /// of the derived polygons until the item collection next changes.
    selection_overlay: Option<PolygonOverlay>,
    category_counts: Option<Value>,
    source_counts: Option<Value>,
    location_counts: Option<Value>,
}

impl Default for FeedSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSynchronizer {
    pub fn new() -> Self {
        Self {
            filters: FilterSelection::default(),
            items: Vec::new(),
            page: PageState::default(),
            loading: false,
            generation: 0,
            markers: Vec::new(),
            polygons: Vec::new(),
            selection_overlay: None,
            category_counts: None,
            source_counts: None,
            location_counts: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Overlays to render: the precise lookup geometry when present,
    /// otherwise the derived projection.
    pub fn overlays(&self) -> &[PolygonOverlay] {
        match &self.selection_overlay {
            Some(overlay) => std::slice::from_ref(overlay),
            None => &self.polygons,
        }
    }

    pub fn category_counts(&self) -> Option<&Value> {
        self.category_counts.as_ref()
    }

    pub fn source_counts(&self) -> Option<&Value> {
        self.source_counts.as_ref()
    }

    pub fn location_counts(&self) -> Option<&Value> {
        self.location_counts.as_ref()
    }

    pub fn item_by_id(&self, id: &str) -> Option<&FeedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    // ========================================================================
    // Apply
    // ========================================================================

    /// Start a new filter session: replace the selection, reset the
    /// pagination state and invalidate every in-flight completion.
    /// Returns the generation the caller must report back with.
    pub fn begin_apply(&mut self, filters: FilterSelection) -> u64 {
        self.filters = filters;
        self.page = PageState::default();
        self.loading = true;
        self.generation += 1;
        self.generation
    }

    /// Apply the settled five-way fetch outcome.
    ///
    /// Returns `None` when the completion is stale, otherwise the names
    /// of the slots that failed (empty on full success). Surviving
    /// slots are applied even when siblings failed; there is no
    /// rollback and no retry.
    pub fn complete_apply(
        &mut self,
        generation: u64,
        outcome: ApplyOutcome,
    ) -> Option<Vec<&'static str>> {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding superseded apply completion"
            );
            return None;
        }
        self.loading = false;

        let mut failed = Vec::new();
        match outcome.items {
            Ok(items) => {
                self.page.has_more = !items.is_empty();
                self.page.page = 0;
                self.replace_items(items);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch report page");
                failed.push("reports");
            }
        }
        match outcome.total {
            Ok(total) => self.page.total = total,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch report count");
                failed.push("count");
            }
        }
        apply_count_slot(
            &mut self.category_counts,
            outcome.category_counts,
            "category counts",
            &mut failed,
        );
        apply_count_slot(
            &mut self.source_counts,
            outcome.source_counts,
            "source counts",
            &mut failed,
        );
        apply_count_slot(
            &mut self.location_counts,
            outcome.location_counts,
            "location counts",
            &mut failed,
        );

        Some(failed)
    }

    // ========================================================================
    // Load More
    // ========================================================================

    /// Arm the next incremental page fetch.
    ///
    /// Returns `None` while a fetch is already in flight or when the
    /// current filter session is exhausted; otherwise the generation
    /// and page index the caller must fetch. Pages are handed out in
    /// strictly increasing order.
    pub fn begin_load_more(&mut self) -> Option<(u64, u32)> {
        if self.loading || !self.page.has_more {
            return None;
        }
        self.loading = true;
        Some((self.generation, self.page.page + 1))
    }

    /// Apply a fetched incremental page.
    ///
    /// Stale completions (a newer apply started meanwhile) are dropped
    /// without touching any state, including the loading flag the newer
    /// apply now owns. An empty page permanently clears `has_more` for
    /// this filter session.
    pub fn complete_load_more(
        &mut self,
        generation: u64,
        page: u32,
        result: Result<Vec<FeedItem>, String>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding superseded page completion"
            );
            return;
        }
        self.loading = false;

        match result {
            Ok(items) => {
                self.page.page = page;
                if items.is_empty() {
                    self.page.has_more = false;
                    return;
                }
                self.append_items(items);
            }
            Err(e) => {
                tracing::error!(page = page, error = %e, "Failed to fetch next page");
            }
        }
    }

    // ========================================================================
    // Selection Overlay
    // ========================================================================

    /// Install precise polygon geometry for the selected item, or clear
    /// it when the selection goes away.
    pub fn set_selection_overlay(&mut self, overlay: Option<PolygonOverlay>) {
        self.selection_overlay = overlay;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn replace_items(&mut self, items: Vec<FeedItem>) {
        self.items = items;
        self.on_items_changed();
    }

    /// Append in arrival order, skipping ids already present so a
    /// misbehaving backend can never duplicate a report in the list.
    fn append_items(&mut self, items: Vec<FeedItem>) {
        let known: HashSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        let fresh: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| !known.contains(item.id.as_str()))
            .collect();
        drop(known);
        self.items.extend(fresh);
        self.on_items_changed();
    }

    /// The one place projections are recomputed: only when the item
    /// collection itself changed, never on unrelated state updates.
    fn on_items_changed(&mut self) {
        self.markers = derive_markers(&self.items);
        self.polygons = derive_polygons(&self.items);
        self.selection_overlay = None;
    }
}

fn apply_count_slot(
    slot: &mut Option<Value>,
    result: Result<Value, String>,
    name: &'static str,
    failed: &mut Vec<&'static str>,
) {
    match result {
        Ok(value) => *slot = Some(value),
        Err(e) => {
            tracing::error!(slot = name, error = %e, "Failed to fetch aggregate counts");
            failed.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: &str) -> FeedItem {
        serde_json::from_str(&format!(r#"{{"_id":"{}","context":"report"}}"#, id)).unwrap()
    }

    fn located_item(id: &str, lat: f64, lng: f64) -> FeedItem {
        serde_json::from_str(&format!(
            r#"{{"_id":"{}","context":"report","locations":{{"latitude":{},"longitude":{}}}}}"#,
            id, lat, lng
        ))
        .unwrap()
    }

    fn ok_outcome(items: Vec<FeedItem>, total: u64) -> ApplyOutcome {
        ApplyOutcome {
            items: Ok(items),
            total: Ok(total),
            category_counts: Ok(serde_json::json!({})),
            source_counts: Ok(serde_json::json!({})),
            location_counts: Ok(serde_json::json!({})),
        }
    }

    #[test]
    fn apply_with_items_resets_page_and_has_more() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        assert!(sync.is_loading());

        let failed = sync
            .complete_apply(generation, ok_outcome(vec![item("a"), item("b")], 2))
            .unwrap();
        assert!(failed.is_empty());
        assert!(!sync.is_loading());
        assert_eq!(sync.items().len(), 2);
        assert_eq!(sync.page().page, 0);
        assert!(sync.page().has_more);
        assert_eq!(sync.page().total, 2);
    }

    #[test]
    fn apply_with_empty_page_clears_has_more() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![], 0));
        assert!(!sync.page().has_more);
        assert!(sync.items().is_empty());
    }

    #[test]
    fn short_but_nonempty_page_keeps_has_more() {
        // Two items against a limit of 100: only a literally empty page
        // clears exhaustion.
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a"), item("b")], 2));
        assert_eq!(sync.items().len(), 2);
        assert!(sync.page().has_more);
    }

    #[test]
    fn stale_apply_completion_is_discarded() {
        let mut sync = FeedSynchronizer::new();
        let old_generation = sync.begin_apply(FilterSelection::default());
        let new_generation = sync.begin_apply(FilterSelection::default());

        // The slow page-1 response from the first apply arrives last.
        assert!(sync
            .complete_apply(new_generation, ok_outcome(vec![item("new")], 1))
            .is_some());
        assert!(sync
            .complete_apply(old_generation, ok_outcome(vec![item("stale")], 9))
            .is_none());

        assert_eq!(sync.items().len(), 1);
        assert_eq!(sync.items()[0].id, "new");
        assert_eq!(sync.page().total, 1);
    }

    #[test]
    fn load_more_appends_in_page_order() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a"), item("b")], 4));

        let (generation, page) = sync.begin_load_more().unwrap();
        assert_eq!(page, 1);
        sync.complete_load_more(generation, page, Ok(vec![item("c"), item("d")]));

        let ids: Vec<&str> = sync.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(sync.page().page, 1);

        let (_, next_page) = sync.begin_load_more().unwrap();
        assert_eq!(next_page, 2);
    }

    #[test]
    fn load_more_gated_while_loading() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a")], 1));

        assert!(sync.begin_load_more().is_some());
        // Second call while the first is still in flight.
        assert!(sync.begin_load_more().is_none());
    }

    #[test]
    fn empty_page_permanently_exhausts_session() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a")], 1));

        let (generation, page) = sync.begin_load_more().unwrap();
        sync.complete_load_more(generation, page, Ok(vec![]));
        assert!(!sync.page().has_more);
        assert!(sync.begin_load_more().is_none());

        // A new apply resets exhaustion.
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("b")], 1));
        assert!(sync.page().has_more);
    }

    #[test]
    fn load_more_never_duplicates_items() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a"), item("b")], 3));

        let (generation, page) = sync.begin_load_more().unwrap();
        // Backend overlap: "b" appears again on page 1.
        sync.complete_load_more(generation, page, Ok(vec![item("b"), item("c")]));

        let ids: Vec<&str> = sync.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn stale_load_more_leaves_new_session_untouched() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a")], 1));
        let (old_generation, old_page) = sync.begin_load_more().unwrap();

        // A new apply supersedes the in-flight page fetch.
        let new_generation = sync.begin_apply(FilterSelection::default());
        sync.complete_load_more(old_generation, old_page, Ok(vec![item("zombie")]));

        // The stale page neither appended nor cleared the apply's
        // loading flag.
        assert!(sync.is_loading());
        assert_eq!(sync.items().len(), 1);

        sync.complete_apply(new_generation, ok_outcome(vec![item("b")], 1));
        assert_eq!(sync.items()[0].id, "b");
    }

    #[test]
    fn failed_load_more_clears_loading_and_keeps_state() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a")], 1));

        let (generation, page) = sync.begin_load_more().unwrap();
        sync.complete_load_more(generation, page, Err("boom".into()));

        assert!(!sync.is_loading());
        assert_eq!(sync.items().len(), 1);
        assert!(sync.page().has_more);
        // Page index unchanged: the fetch did not succeed.
        assert_eq!(sync.page().page, 0);
    }

    #[test]
    fn partial_apply_failure_applies_surviving_slots() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        let failed = sync
            .complete_apply(
                generation,
                ApplyOutcome {
                    items: Ok(vec![item("a")]),
                    total: Err("count endpoint down".into()),
                    category_counts: Ok(serde_json::json!({"Water": 3})),
                    source_counts: Err("down".into()),
                    location_counts: Ok(serde_json::json!({})),
                },
            )
            .unwrap();

        assert_eq!(failed, vec!["count", "source counts"]);
        assert_eq!(sync.items().len(), 1);
        assert!(!sync.is_loading());
        assert!(sync.category_counts().is_some());
    }

    #[test]
    fn projections_follow_item_changes() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(
            generation,
            ok_outcome(vec![located_item("a", 31.5, 34.4), item("b")], 2),
        );
        assert_eq!(sync.markers().len(), 1);

        let (generation, page) = sync.begin_load_more().unwrap();
        sync.complete_load_more(generation, page, Ok(vec![located_item("c", 33.8, 35.5)]));
        assert_eq!(sync.markers().len(), 2);
        assert_eq!(sync.markers()[1].item_index, 2);
    }

    #[test]
    fn selection_overlay_replaces_derived_until_items_change() {
        let mut sync = FeedSynchronizer::new();
        let generation = sync.begin_apply(FilterSelection::default());
        sync.complete_apply(generation, ok_outcome(vec![item("a")], 1));

        let overlay = PolygonOverlay {
            rings: vec![vec![[34.2, 31.2], [34.3, 31.3]]],
        };
        sync.set_selection_overlay(Some(overlay.clone()));
        assert_eq!(sync.overlays(), std::slice::from_ref(&overlay));

        let (generation, page) = sync.begin_load_more().unwrap();
        sync.complete_load_more(generation, page, Ok(vec![item("b")]));
        assert!(sync.overlays().is_empty());
    }
}
