//! Visual identity for report categories and sources.
//!
//! The backend sends category and source names as free strings. Instead
//! of string-matching against asset filenames at render time, both are
//! parsed once into closed enums with total mappings to a glyph and a
//! color; anything unrecognized lands on the defined fallback variant.

use ratatui::style::Color;

/// The fixed category set, plus `Other` for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Access,
    Aid,
    Diplomatic,
    Facilities,
    Financial,
    Food,
    Fuel,
    Humanitarian,
    InternationalRelations,
    MedicalSupplies,
    Military,
    Population,
    Security,
    Trucks,
    Water,
    Health,
    Other,
}

impl Category {
    /// Case-insensitive parse; unknown or absent names map to `Other`.
    pub fn parse(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Category::Other;
        };
        match name.to_ascii_lowercase().as_str() {
            "access" => Category::Access,
            "aid" => Category::Aid,
            "diplomatic" => Category::Diplomatic,
            "facilities" => Category::Facilities,
            "financial" => Category::Financial,
            "food" => Category::Food,
            "fuel" => Category::Fuel,
            "humanitarian" => Category::Humanitarian,
            "international relations" => Category::InternationalRelations,
            "medical supplies" => Category::MedicalSupplies,
            "military" => Category::Military,
            "population" => Category::Population,
            "security" => Category::Security,
            "trucks" => Category::Trucks,
            "water" => Category::Water,
            "health" => Category::Health,
            _ => Category::Other,
        }
    }

    /// Marker glyph for map and list rendering.
    pub fn glyph(self) -> &'static str {
        match self {
            Category::Access => "⛩",
            Category::Aid => "✚",
            Category::Diplomatic => "⚖",
            Category::Facilities => "⌂",
            Category::Financial => "$",
            Category::Food => "✾",
            Category::Fuel => "⛽",
            Category::Humanitarian => "♥",
            Category::InternationalRelations => "✈",
            Category::MedicalSupplies => "✚",
            Category::Military => "✪",
            Category::Population => "⛺",
            Category::Security => "⛨",
            Category::Trucks => "⛟",
            Category::Water => "≋",
            Category::Health => "♡",
            Category::Other => "●",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Category::Access => Color::LightMagenta,
            Category::Aid => Color::LightGreen,
            Category::Diplomatic => Color::Blue,
            Category::Facilities => Color::Gray,
            Category::Financial => Color::Yellow,
            Category::Food => Color::Green,
            Category::Fuel => Color::LightYellow,
            Category::Humanitarian => Color::LightRed,
            Category::InternationalRelations => Color::Cyan,
            Category::MedicalSupplies => Color::Red,
            Category::Military => Color::LightRed,
            Category::Population => Color::Magenta,
            Category::Security => Color::LightBlue,
            Category::Trucks => Color::LightCyan,
            Category::Water => Color::Blue,
            Category::Health => Color::Red,
            Category::Other => Color::DarkGray,
        }
    }

    /// Display label; `Other` is shown as in the original UI.
    pub fn label(self) -> &'static str {
        match self {
            Category::Access => "Access",
            Category::Aid => "Aid",
            Category::Diplomatic => "Diplomatic",
            Category::Facilities => "Facilities",
            Category::Financial => "Financial",
            Category::Food => "Food",
            Category::Fuel => "Fuel",
            Category::Humanitarian => "Humanitarian",
            Category::InternationalRelations => "International Relations",
            Category::MedicalSupplies => "Medical Supplies",
            Category::Military => "Military",
            Category::Population => "Population",
            Category::Security => "Security",
            Category::Trucks => "Trucks",
            Category::Water => "Water",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }
}

/// Known ingestion sources; everything else renders as `Web`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Twitter,
    Telegram,
    Youtube,
    Web,
    Tiktok,
}

impl SourceKind {
    pub fn parse(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return SourceKind::Web;
        };
        match name.to_ascii_lowercase().as_str() {
            "twitter" => SourceKind::Twitter,
            // Telegram arrives abbreviated on the wire
            "t" => SourceKind::Telegram,
            "youtube" => SourceKind::Youtube,
            "tiktok" => SourceKind::Tiktok,
            _ => SourceKind::Web,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            SourceKind::Twitter => "🐦",
            SourceKind::Telegram => "✉",
            SourceKind::Youtube => "▶",
            SourceKind::Web => "🌐",
            SourceKind::Tiktok => "♪",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Category::parse(Some("water")), Category::Water);
        assert_eq!(Category::parse(Some("WATER")), Category::Water);
        assert_eq!(
            Category::parse(Some("International Relations")),
            Category::InternationalRelations
        );
    }

    #[test]
    fn unknown_and_absent_fall_back_to_other() {
        assert_eq!(Category::parse(Some("Cryptozoology")), Category::Other);
        assert_eq!(Category::parse(None), Category::Other);
        assert_eq!(Category::Other.glyph(), "●");
    }

    #[test]
    fn unknown_source_renders_as_web() {
        assert_eq!(SourceKind::parse(Some("carrier-pigeon")), SourceKind::Web);
        assert_eq!(SourceKind::parse(None), SourceKind::Web);
        assert_eq!(SourceKind::parse(Some("t")), SourceKind::Telegram);
    }
}
