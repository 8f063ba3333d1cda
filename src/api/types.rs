//! Wire types for the incident-report backend.
//!
//! All structs mirror the backend's JSON verbatim. Optional and malformed
//! fields deserialize to `None` rather than failing the whole payload —
//! a report with no coordinates is still a valid report.

use serde::Deserialize;

/// One ingested report, fetched read-only from the backend.
///
/// `id` is the stable equality key used for selection and highlight
/// comparisons; items are never mutated locally except by list
/// concatenation during pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub locations: Option<Location>,
    #[serde(default, rename = "locationPolygons")]
    pub location_polygons: Option<PolygonGeometry>,
}

impl FeedItem {
    /// Coordinates of this report, when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let loc = self.locations.as_ref()?;
        match (loc.latitude, loc.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Source descriptor: where the report was ingested from.
///
/// `published_at` is kept as the raw wire string and parsed at render
/// time; an unparseable timestamp degrades to "Unknown Time" instead of
/// rejecting the item.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Optional location descriptor attached to a report.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Polygon geometry as carried inline on a feed item: a list of
/// `[lng, lat]` rings.
#[derive(Debug, Clone, Deserialize)]
pub struct PolygonGeometry {
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

/// Response shape of `get_count_of_news_by_filter`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NewsCount {
    #[serde(default)]
    pub news_count: u64,
}

/// One element of the `get_document_by_location_id` response.
///
/// Only entries with `type == "Polygon"` carry usable geometry; the ring
/// arrives as `[lat, lng]` pairs and must be coordinate-swapped before
/// use as overlay geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationDocument {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub polygon: Vec<Vec<[f64; 2]>>,
}

/// Enumerated filter option lists fetched at startup.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub areas: Vec<String>,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    pub types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_with_full_location_has_coordinates() {
        let item: FeedItem = serde_json::from_str(
            r#"{"_id":"a1","context":"report","locations":{"name":"Rafah","latitude":31.3,"longitude":34.25,"location_id":"loc-9"}}"#,
        )
        .unwrap();
        assert_eq!(item.coordinates(), Some((31.3, 34.25)));
    }

    #[test]
    fn item_with_partial_location_has_none() {
        let item: FeedItem = serde_json::from_str(
            r#"{"_id":"a2","context":"x","locations":{"name":"Gaza","latitude":31.5}}"#,
        )
        .unwrap();
        assert_eq!(item.coordinates(), None);
    }

    #[test]
    fn item_with_null_fields_deserializes() {
        let item: FeedItem = serde_json::from_str(
            r#"{"_id":"a3","category":null,"context":"x","source":null,"locations":null}"#,
        )
        .unwrap();
        assert!(item.category.is_none());
        assert!(item.source.is_none());
        assert_eq!(item.coordinates(), None);
    }

    #[test]
    fn inline_polygon_geometry_parses() {
        let item: FeedItem = serde_json::from_str(
            r#"{"_id":"a4","context":"x","locationPolygons":{"coordinates":[[[34.2,31.2],[34.3,31.2],[34.3,31.3]]]}}"#,
        )
        .unwrap();
        let geom = item.location_polygons.unwrap();
        assert_eq!(geom.coordinates[0].len(), 3);
        assert_eq!(geom.coordinates[0][0], [34.2, 31.2]);
    }
}
