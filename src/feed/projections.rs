//! Derived projections of the feed item collection.
//!
//! Markers and polygon overlays are pure functions of the current item
//! list. They are recomputed whenever the collection changes and never
//! stored independently of it.

use crate::api::FeedItem;

/// A point marker derived from one feed item with usable coordinates.
///
/// Holds an index into the item collection rather than a clone; the
/// synchronizer recomputes all markers whenever the collection changes,
/// so indices never dangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub item_index: usize,
}

/// Polygon overlay geometry: rings of `[lng, lat]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonOverlay {
    pub rings: Vec<Vec<[f64; 2]>>,
}

/// A marker for every item whose latitude and longitude are both
/// present and finite.
pub fn derive_markers(items: &[FeedItem]) -> Vec<Marker> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            item.coordinates().map(|(lat, lng)| Marker {
                lat,
                lng,
                item_index: i,
            })
        })
        .collect()
}

/// An overlay for every item carrying inline polygon geometry.
pub fn derive_polygons(items: &[FeedItem]) -> Vec<PolygonOverlay> {
    items
        .iter()
        .filter_map(|item| item.location_polygons.as_ref())
        .map(|geom| PolygonOverlay {
            rings: geom.coordinates.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> FeedItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn markers_require_both_coordinates() {
        let items = vec![
            item(r#"{"_id":"a","context":"x","locations":{"latitude":31.5,"longitude":34.4}}"#),
            item(r#"{"_id":"b","context":"x","locations":{"latitude":31.5}}"#),
            item(r#"{"_id":"c","context":"x"}"#),
            item(r#"{"_id":"d","context":"x","locations":{"latitude":33.8,"longitude":35.5}}"#),
        ];
        let markers = derive_markers(&items);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].item_index, 0);
        assert_eq!(markers[1].item_index, 3);
        assert_eq!((markers[1].lat, markers[1].lng), (33.8, 35.5));
    }

    #[test]
    fn polygons_only_from_items_with_geometry() {
        let items = vec![
            item(r#"{"_id":"a","context":"x"}"#),
            item(
                r#"{"_id":"b","context":"x","locationPolygons":{"coordinates":[[[34.2,31.2],[34.3,31.3]]]}}"#,
            ),
        ];
        let polygons = derive_polygons(&items);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].rings[0][1], [34.3, 31.3]);
    }

    #[test]
    fn empty_collection_yields_empty_projections() {
        assert!(derive_markers(&[]).is_empty());
        assert!(derive_polygons(&[]).is_empty());
    }
}
