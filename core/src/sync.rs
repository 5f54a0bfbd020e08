//! Session & sync client.
//!
//! # Design
//! `SyncClient` owns the token, drives the stateless [`WmtClient`] through a
//! [`Transport`], and publishes results into a shared [`StateHandle`].
//!
//! - Every fetch replaces its collection wholesale. A failed fetch leaves the
//!   previous snapshot in place and only sets `error_message`.
//! - Mutations never patch local collections; a successful create, update or
//!   delete is followed by exactly one `fetch_statuses` before returning.
//! - Operations take `&self`, so one client may be shared between threads.
//!   Overlapping fetches race and the last one to finish wins.
//! - A fetch response is applied only if the token that sent it is still the
//!   session token; a logout or a new login while it runs discards it.
//! - Failures are recorded in `error_message` and also returned to the caller.
//!   Nothing is retried.

use tracing::{debug, info, warn};

use crate::client::WmtClient;
use crate::error::ClientError;
use crate::geocode::{self, CountryResolution, Geocoder};
use crate::http::{HttpRequest, HttpResponse};
use crate::markers::partition_markers;
use crate::state::{ClientState, SessionPhase, StateHandle};
use crate::store::TokenStore;
use crate::transport::Transport;
use crate::types::{Coordinate, Credentials, NewCountryStatus, Registration, StatusKind};

const NOT_LOGGED_IN: &str = "Not logged in";
const INVALID_COUNTRY: &str = "Invalid country";

pub struct SyncClient<T, S> {
    api: WmtClient,
    transport: T,
    store: S,
    state: StateHandle,
}

#[cfg(feature = "transport")]
impl SyncClient<crate::transport::UreqTransport, crate::store::FileTokenStore> {
    /// Client wired to the real network and the on-disk token store.
    pub fn from_config(config: &crate::config::ClientConfig) -> Self {
        Self::new(
            &config.base_url,
            crate::transport::UreqTransport::new(config.timeout()),
            config.token_store(),
        )
    }
}

impl<T: Transport, S: TokenStore> SyncClient<T, S> {
    /// Create a client, restoring a persisted token if one exists.
    ///
    /// Restoring performs no network call; call [`SyncClient::refresh`] to
    /// load data for a restored session.
    pub fn new(base_url: &str, transport: T, store: S) -> Self {
        let state = StateHandle::default();
        match store.load() {
            Ok(Some(token)) if !token.is_empty() => {
                info!("restored persisted session");
                state.update(|s| {
                    s.token = Some(token);
                    s.phase = SessionPhase::Authenticated;
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not read persisted token"),
        }
        Self {
            api: WmtClient::new(base_url),
            transport,
            store,
            state,
        }
    }

    /// Handle for observers. Clones share the same state.
    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn clear_error(&self) {
        self.state.clear_error();
    }

    /// Exchange credentials for a token, persist it, then load countries and
    /// statuses.
    ///
    /// Follow-up fetch failures are recorded in the state but do not fail the
    /// login. A rejected login leaves the previous session untouched.
    pub fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let prior = self.state.update(|s| {
            let prior = s.phase;
            s.phase = SessionPhase::Authenticating;
            prior
        });

        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let result = self
            .api
            .build_login(&credentials)
            .and_then(|req| self.send(&req))
            .and_then(|resp| self.api.parse_login(resp));

        let token = match result {
            Ok(token) => token,
            Err(e) => {
                self.state.update(|s| s.phase = prior);
                return Err(self.fail("login", e));
            }
        };

        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "could not persist token");
        }
        self.state.update(|s| {
            if s.token.as_deref() != Some(token.as_str()) {
                s.countries.clear();
                s.visited.clear();
                s.want_to_visit.clear();
            }
            s.token = Some(token);
            s.phase = SessionPhase::Authenticated;
        });
        info!(username, "logged in");

        let _ = self.fetch_countries();
        let _ = self.fetch_statuses();
        Ok(())
    }

    /// Create an account, then log in with the same credentials.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ClientError> {
        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api
            .build_register(&registration)
            .and_then(|req| self.send(&req))
            .and_then(|resp| self.api.parse_register(resp))
            .map_err(|e| self.fail("register", e))?;
        info!(username, "registered");
        self.login(username, password)
    }

    /// Drop the session locally. No network call; always succeeds.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear persisted token");
        }
        self.state.update(|s| {
            s.token = None;
            s.phase = SessionPhase::Unauthenticated;
            s.countries.clear();
            s.visited.clear();
            s.want_to_visit.clear();
        });
        info!("logged out");
    }

    /// Load countries and statuses, e.g. after restoring a session.
    ///
    /// Both fetches run even if the first fails; the first error is returned.
    pub fn refresh(&self) -> Result<(), ClientError> {
        let countries = self.fetch_countries();
        let statuses = self.fetch_statuses();
        countries.and(statuses)
    }

    pub fn fetch_countries(&self) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let req = self.api.build_list_countries(&token);
        let countries = self
            .send(&req)
            .and_then(|resp| self.api.parse_list_countries(resp))
            .map_err(|e| self.fail("fetch countries", e))?;
        let count = countries.len();
        let applied = self.state.update(|s| {
            let current = s.token.as_deref() == Some(token.as_str());
            if current {
                s.countries = countries;
            }
            current
        });
        if applied {
            debug!(count, "countries replaced");
        } else {
            debug!("session changed during fetch, countries dropped");
        }
        Ok(())
    }

    pub fn fetch_statuses(&self) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let req = self.api.build_list_statuses(&token);
        let records = self
            .send(&req)
            .and_then(|resp| self.api.parse_list_statuses(resp))
            .map_err(|e| self.fail("fetch statuses", e))?;
        let markers = partition_markers(&records);
        let (visited, want_to_visit) = (markers.visited.len(), markers.want_to_visit.len());
        let applied = self.state.update(|s| {
            let current = s.token.as_deref() == Some(token.as_str());
            if current {
                s.visited = markers.visited;
                s.want_to_visit = markers.want_to_visit;
            }
            current
        });
        if applied {
            debug!(visited, want_to_visit, "markers rebuilt");
        } else {
            debug!("session changed during fetch, markers dropped");
        }
        Ok(())
    }

    /// Record a status for `country_id`. A `None` id (an unresolved country)
    /// is rejected before any request is made.
    pub fn add_status(
        &self,
        country_id: Option<i64>,
        status: StatusKind,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let Some(country) = country_id else {
            return Err(self.fail("add status", ClientError::Validation(INVALID_COUNTRY.to_string())));
        };
        let input = NewCountryStatus {
            country,
            status,
            latitude,
            longitude,
        };
        self.api
            .build_create_status(&token, &input)
            .and_then(|req| self.send(&req))
            .and_then(|resp| self.api.parse_create_status(resp))
            .map_err(|e| self.fail("add status", e))?;
        info!(country, %status, "status added");
        let _ = self.fetch_statuses();
        Ok(())
    }

    /// Replace an existing status record, e.g. to move a country from
    /// want-to-visit to visited.
    pub fn update_status(
        &self,
        status_id: i64,
        country_id: i64,
        status: StatusKind,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let input = NewCountryStatus {
            country: country_id,
            status,
            latitude,
            longitude,
        };
        self.api
            .build_update_status(&token, status_id, &input)
            .and_then(|req| self.send(&req))
            .and_then(|resp| self.api.parse_update_status(resp))
            .map_err(|e| self.fail("update status", e))?;
        info!(status_id, %status, "status updated");
        let _ = self.fetch_statuses();
        Ok(())
    }

    pub fn delete_status(&self, status_id: i64) -> Result<(), ClientError> {
        let token = self.require_token()?;
        let req = self.api.build_delete_status(&token, status_id);
        self.send(&req)
            .and_then(|resp| self.api.parse_delete_status(resp))
            .map_err(|e| self.fail("delete status", e))?;
        info!(status_id, "status deleted");
        let _ = self.fetch_statuses();
        Ok(())
    }

    /// Geocode a tapped coordinate and match it against cached countries.
    pub fn resolve_country_at(
        &self,
        geocoder: &impl Geocoder,
        latitude: f64,
        longitude: f64,
    ) -> CountryResolution {
        let countries = self.state.update(|s| s.countries.clone());
        geocode::resolve_country(geocoder, &countries, Coordinate::new(latitude, longitude))
    }

    fn require_token(&self) -> Result<String, ClientError> {
        let token = self
            .state
            .update(|s| s.token.clone().filter(|t| !t.is_empty()));
        token.ok_or_else(|| self.fail("request", ClientError::Validation(NOT_LOGGED_IN.to_string())))
    }

    fn send(&self, req: &HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = req.method.as_str(), path = %req.path, "sending request");
        let _loading = LoadingGuard::new(&self.state);
        let response = self.transport.execute(req)?;
        debug!(status = response.status, path = %req.path, "received response");
        Ok(response)
    }

    fn fail(&self, operation: &str, err: ClientError) -> ClientError {
        warn!(operation, error = %err, "operation failed");
        let message = err.to_string();
        self.state.update(|s| s.error_message = Some(message));
        err
    }
}

/// Keeps `loading` raised for the lifetime of one request.
struct LoadingGuard<'a> {
    state: &'a StateHandle,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a StateHandle) -> Self {
        state.update(ClientState::begin_request);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.update(ClientState::end_request);
    }
}
