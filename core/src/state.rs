//! Observable client state.
//!
//! # Design
//! `SyncClient` is the only writer. The presentation layer holds a cloned
//! [`StateHandle`] and pulls [`ClientState`] snapshots whenever it wants to
//! redraw; it may do so from another thread while a request is in flight.
//! Writers take the lock only for short, whole-collection replacements and
//! never across network I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::{Country, CountryMarker};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub token: Option<String>,
    pub phase: SessionPhase,
    pub loading: bool,
    /// Last failure, kept until [`StateHandle::clear_error`] is called.
    pub error_message: Option<String>,
    pub countries: Vec<Country>,
    pub visited: Vec<CountryMarker>,
    pub want_to_visit: Vec<CountryMarker>,
    in_flight: usize,
}

impl ClientState {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub(crate) fn begin_request(&mut self) {
        self.in_flight += 1;
        self.loading = true;
    }

    pub(crate) fn end_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
    }
}

/// Shared, clonable view of one client's state.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<ClientState>>,
}

impl StateHandle {
    pub fn snapshot(&self) -> ClientState {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn clear_error(&self) {
        self.lock().error_message = None;
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ClientState) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
