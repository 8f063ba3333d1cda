//! Filter-query builder: turns a structured filter selection into the flat
//! request-parameter set the backend expects.
//!
//! The contract is strictly "omit empty": a default selection produces no
//! parameters at all, multi-valued fields are comma-joined into a single
//! value, and dates serialize as `YYYY-MM-DD`. No validation beyond
//! presence — malformed search terms pass through to the backend as-is.

use chrono::NaiveDate;

/// Default geo-radius in kilometers (unit implied by the backend).
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// A coordinate picked on the map, used as the geo-radius center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedPoint {
    pub lat: f64,
    pub lng: f64,
}

/// User-chosen query state. Replaced wholesale on Apply, reset to
/// defaults on Reset; every field is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub locations: Vec<String>,
    pub sources: Vec<String>,
    /// Category names. The wire parameter is called `type`.
    pub categories: Vec<String>,
    pub search_terms: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub point: Option<PickedPoint>,
    pub radius_km: f64,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            sources: Vec::new(),
            categories: Vec::new(),
            search_terms: String::new(),
            start_date: None,
            end_date: None,
            point: None,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl FilterSelection {
    /// Build the flat parameter mapping for this selection.
    ///
    /// Pure transform; callers merge the result with pagination
    /// parameters (`page`, `limit`). The radius rides along only when a
    /// point has been picked — on its own it is a default, not a filter.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if !self.locations.is_empty() {
            params.push(("location".into(), self.locations.join(",")));
        }
        if !self.sources.is_empty() {
            params.push(("source".into(), self.sources.join(",")));
        }
        if !self.categories.is_empty() {
            params.push(("type".into(), self.categories.join(",")));
        }
        if !self.search_terms.trim().is_empty() {
            params.push(("search_terms".into(), self.search_terms.clone()));
        }
        if let Some(start) = self.start_date {
            params.push(("start_date".into(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("end_date".into(), end.format("%Y-%m-%d").to_string()));
        }
        if let Some(point) = self.point {
            params.push(("longitude".into(), format!("{:.4}", point.lng)));
            params.push(("latitude".into(), format!("{:.4}", point.lat)));
            params.push(("radius".into(), trim_float(self.radius_km)));
        }

        params
    }
}

/// Format a radius without a trailing `.0` for whole values, matching
/// what the numeric form field would have submitted.
fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_selection_yields_no_params() {
        let params = FilterSelection::default().to_params();
        assert_eq!(params, Vec::<(String, String)>::new());
    }

    #[test]
    fn multi_values_are_comma_joined() {
        let selection = FilterSelection {
            locations: vec!["Rafah".into(), "Khan Younis".into()],
            categories: vec!["Water".into(), "Food".into()],
            ..Default::default()
        };
        let params = selection.to_params();
        assert_eq!(lookup(&params, "location"), Some("Rafah,Khan Younis"));
        assert_eq!(lookup(&params, "type"), Some("Water,Food"));
        assert_eq!(lookup(&params, "source"), None);
    }

    #[test]
    fn dates_format_as_ymd() {
        let selection = FilterSelection {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 7),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 8),
            ..Default::default()
        };
        let params = selection.to_params();
        assert_eq!(lookup(&params, "start_date"), Some("2024-03-07"));
        assert_eq!(lookup(&params, "end_date"), Some("2024-03-08"));
    }

    #[test]
    fn whitespace_search_term_is_omitted() {
        let selection = FilterSelection {
            search_terms: "   ".into(),
            ..Default::default()
        };
        assert!(selection.to_params().is_empty());
    }

    #[test]
    fn radius_only_sent_with_picked_point() {
        // Radius carries the default value, but without a point it is
        // not a filter and must be omitted.
        let without_point = FilterSelection::default();
        assert!(without_point.to_params().is_empty());

        let with_point = FilterSelection {
            point: Some(PickedPoint {
                lat: 31.5147,
                lng: 34.4542,
            }),
            ..Default::default()
        };
        let params = with_point.to_params();
        assert_eq!(lookup(&params, "latitude"), Some("31.5147"));
        assert_eq!(lookup(&params, "longitude"), Some("34.4542"));
        assert_eq!(lookup(&params, "radius"), Some("10"));
    }

    proptest::proptest! {
        // The omit-empty contract holds for arbitrary selections: no
        // empty keys or values, and the geo triple rides only with a
        // picked point.
        #[test]
        fn params_are_never_empty_and_radius_follows_point(
            locations in proptest::collection::vec("[A-Za-z ]{1,12}", 0..4),
            search in "\\PC{0,20}",
            radius in 0.1f64..500.0,
            with_point in proptest::prelude::any::<bool>(),
        ) {
            let selection = FilterSelection {
                locations,
                search_terms: search,
                radius_km: radius,
                point: with_point.then_some(PickedPoint { lat: 31.0, lng: 34.0 }),
                ..Default::default()
            };
            let params = selection.to_params();
            for (key, value) in &params {
                proptest::prop_assert!(!key.is_empty());
                proptest::prop_assert!(!value.is_empty());
            }
            let has_radius = params.iter().any(|(k, _)| k == "radius");
            proptest::prop_assert_eq!(has_radius, with_point);
        }
    }

    #[test]
    fn fractional_radius_preserved() {
        let selection = FilterSelection {
            point: Some(PickedPoint { lat: 1.0, lng: 2.0 }),
            radius_km: 2.5,
            ..Default::default()
        };
        let params = selection.to_params();
        assert_eq!(lookup(&params, "radius"), Some("2.5"));
    }
}
