//! Client core for the world map tracker service.
//!
//! # Overview
//! Tracks the countries a user has visited or wants to visit against a
//! token-authenticated REST API. The presentation layer (map, lists, login
//! form) lives outside this crate; it renders [`ClientState`] snapshots and
//! forwards user intents into a [`SyncClient`].
//!
//! # Design
//! - `WmtClient` is stateless: each endpoint is a `build_*` method producing
//!   an `HttpRequest` and a `parse_*` method consuming an `HttpResponse`. It
//!   never touches the network, which keeps it usable over the C ABI.
//! - `SyncClient` layers the session on top: it owns the token, executes
//!   requests through a `Transport`, and replaces its collections wholesale
//!   on every successful fetch.
//! - Token persistence (`TokenStore`) and reverse geocoding (`Geocoder`) are
//!   traits so hosts can plug in platform implementations.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod geocode;
pub mod http;
pub mod markers;
pub mod state;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;

pub use client::WmtClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use geocode::{CountryResolution, Geocoder};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use markers::{partition_markers, MarkerSet};
pub use state::{ClientState, SessionPhase, StateHandle};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use sync::SyncClient;
pub use transport::Transport;
#[cfg(feature = "transport")]
pub use transport::UreqTransport;
pub use types::{
    Coordinate, Country, CountryMarker, CountryStatusRecord, Credentials, NewCountryStatus,
    Registration, StatusKind,
};
