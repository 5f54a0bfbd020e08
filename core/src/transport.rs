//! The single place where requests touch the network.
//!
//! `SyncClient` is generic over [`Transport`], so tests drive it with a
//! scripted in-memory transport and production code plugs in
//! [`UreqTransport`] (feature `transport`).

use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Non-2xx answers are returned as `Ok(HttpResponse)`; `Err` is reserved for
/// failures that produced no response at all.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "transport")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "transport")]
mod blocking {
    use std::time::Duration;

    use super::Transport;
    use crate::error::ClientError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    ///
    /// Status codes are never turned into errors, and every request is bounded
    /// by the configured global timeout.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new(timeout: Option<Duration>) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new(Some(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS)))
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
            let result = match (request.method, request.body.as_deref()) {
                (HttpMethod::Get, _) => {
                    let mut builder = self.agent.get(request.path.as_str());
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    builder.call()
                }
                (HttpMethod::Delete, _) => {
                    let mut builder = self.agent.delete(request.path.as_str());
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    builder.call()
                }
                (method, body) => {
                    let mut builder = match method {
                        HttpMethod::Put => self.agent.put(request.path.as_str()),
                        _ => self.agent.post(request.path.as_str()),
                    };
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    match body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| ClientError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
