//! Wire DTOs and derived view models for the world map tracker API.
//!
//! # Design
//! Field names follow the server's snake_case JSON. Unknown fields (the
//! server also sends `created_at` / `updated_at`) are ignored on decode.
//! `CountryStatusRecord::status` stays a raw `String` so a record with an
//! unexpected status value still decodes; reconciliation decides what to do
//! with it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reference country known to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso_code: String,
}

/// The two relationships a user can have with a country.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Visited,
    WantToVisit,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Visited => "visited",
            StatusKind::WantToVisit => "want_to_visit",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "visited" => Some(StatusKind::Visited),
            "want_to_visit" => Some(StatusKind::WantToVisit),
            _ => None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's relationship to one country, as returned by `/country-statuses/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryStatusRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub country: i64,
    #[serde(default)]
    pub country_name: Option<String>,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CountryStatusRecord {
    pub fn kind(&self) -> Option<StatusKind> {
        StatusKind::parse(&self.status)
    }
}

/// Request payload for creating or replacing a status record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCountryStatus {
    pub country: i64,
    pub status: StatusKind,
    pub latitude: f64,
    pub longitude: f64,
}

/// Body of `POST /api-token-auth/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /register/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response of `POST /api-token-auth/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Renderable point derived from one `CountryStatusRecord`. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMarker {
    pub name: String,
    pub coordinate: Coordinate,
    pub status: StatusKind,
    pub country_id: i64,
    pub status_id: Option<i64>,
}

impl CountryMarker {
    /// Marker name used when the server omitted `country_name`.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Build a marker from a record whose status has already been classified.
    pub fn from_record(record: &CountryStatusRecord, status: StatusKind) -> Self {
        Self {
            name: record
                .country_name
                .clone()
                .unwrap_or_else(|| Self::UNKNOWN_NAME.to_string()),
            coordinate: Coordinate::new(record.latitude, record.longitude),
            status,
            country_id: record.country,
            status_id: record.id,
        }
    }
}
