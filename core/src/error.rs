//! Error types for the world map tracker client.
//!
//! # Design
//! One variant per failure class the presentation layer cares about. Every
//! variant renders a human-readable message through `Display`; that string is
//! what `SyncClient` stores in `ClientState::error_message`.

use thiserror::Error;

/// Errors returned by `WmtClient` parse methods and `SyncClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, refused, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The token or registration endpoint rejected the request.
    #[error("{}", server_message(*status, message.as_deref()))]
    Auth { status: u16, message: Option<String> },

    /// A data endpoint returned a non-2xx status. `message` carries the
    /// server-supplied explanation when the body had one.
    #[error("{}", server_message(*status, message.as_deref()))]
    Api { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("Error decoding response: {0}")]
    Decoding(String),

    /// The request payload could not be serialized to JSON.
    #[error("Error encoding request: {0}")]
    Serialization(String),

    /// A local precondition failed before any request was attempted.
    #[error("{0}")]
    Validation(String),

    /// The token store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status, .. } | ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

fn server_message(status: u16, message: Option<&str>) -> String {
    match message {
        Some(msg) => msg.to_string(),
        None => format!("Server error: {status}"),
    }
}
