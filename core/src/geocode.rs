//! Coordinate to country resolution.
//!
//! Reverse geocoding itself is a platform capability and stays behind the
//! `Geocoder` trait. This module only matches the geocoded name against the
//! cached reference list.

use crate::types::{Coordinate, Country};

/// Maps a coordinate to the name of the country containing it.
pub trait Geocoder {
    fn country_name(&self, coordinate: Coordinate) -> Option<String>;
}

impl<F> Geocoder for F
where
    F: Fn(Coordinate) -> Option<String>,
{
    fn country_name(&self, coordinate: Coordinate) -> Option<String> {
        self(coordinate)
    }
}

/// Outcome of resolving a tapped coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryResolution {
    /// Name reported by the geocoder, as given.
    pub name: Option<String>,
    /// Id of the first local country whose name matches, if any.
    pub country_id: Option<i64>,
}

impl CountryResolution {
    /// A status can only be recorded for a country the server knows.
    pub fn can_add(&self) -> bool {
        self.country_id.is_some()
    }
}

/// Case-insensitive exact name match; first match wins.
pub fn match_country<'a>(countries: &'a [Country], name: &str) -> Option<&'a Country> {
    let wanted = name.to_lowercase();
    countries.iter().find(|c| c.name.to_lowercase() == wanted)
}

/// Geocode `coordinate` and match the result against `countries`.
pub fn resolve_country(
    geocoder: &impl Geocoder,
    countries: &[Country],
    coordinate: Coordinate,
) -> CountryResolution {
    let Some(name) = geocoder.country_name(coordinate) else {
        return CountryResolution::default();
    };
    let country_id = match_country(countries, &name).map(|c| c.id);
    CountryResolution {
        name: Some(name),
        country_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<Country> {
        vec![
            Country {
                id: 1,
                name: "France".to_string(),
                iso_code: "FRA".to_string(),
            },
            Country {
                id: 2,
                name: "Japan".to_string(),
                iso_code: "JPN".to_string(),
            },
        ]
    }

    #[test]
    fn matches_case_insensitively() {
        let geocoder = |_: Coordinate| Some("france".to_string());
        let resolved = resolve_country(&geocoder, &countries(), Coordinate::new(48.8, 2.3));
        assert_eq!(resolved.name.as_deref(), Some("france"));
        assert_eq!(resolved.country_id, Some(1));
        assert!(resolved.can_add());
    }

    #[test]
    fn unmatched_name_is_returned_without_id() {
        let geocoder = |_: Coordinate| Some("Atlantis".to_string());
        let resolved = resolve_country(&geocoder, &countries(), Coordinate::new(0.0, -30.0));
        assert_eq!(resolved.name.as_deref(), Some("Atlantis"));
        assert_eq!(resolved.country_id, None);
        assert!(!resolved.can_add());
    }

    #[test]
    fn no_geocode_result_resolves_to_nothing() {
        let geocoder = |_: Coordinate| -> Option<String> { None };
        let resolved = resolve_country(&geocoder, &countries(), Coordinate::new(0.0, 0.0));
        assert_eq!(resolved, CountryResolution::default());
    }

    #[test]
    fn first_match_wins() {
        let mut list = countries();
        list.push(Country {
            id: 99,
            name: "FRANCE".to_string(),
            iso_code: "FRX".to_string(),
        });
        assert_eq!(match_country(&list, "France").map(|c| c.id), Some(1));
    }

    #[test]
    fn no_partial_matching() {
        assert!(match_country(&countries(), "Fran").is_none());
        assert!(match_country(&countries(), " France").is_none());
    }
}
