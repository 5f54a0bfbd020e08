//! Stateless HTTP request builder and response parser for the tracker API.
//!
//! # Design
//! `WmtClient` holds only the API base URL and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip.
//!
//! The token endpoint lives at the server root rather than under the API
//! prefix, so a base URL of `http://host:8000/api` authenticates against
//! `http://host:8000/api-token-auth/`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthToken, Country, CountryStatusRecord, Credentials, NewCountryStatus, Registration};

const API_SUFFIX: &str = "/api";

/// Synchronous, stateless client for the tracker API.
#[derive(Debug, Clone)]
pub struct WmtClient {
    base_url: String,
}

impl WmtClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server root: the base URL without its trailing `/api` segment.
    pub fn root_url(&self) -> &str {
        self.base_url
            .strip_suffix(API_SUFFIX)
            .unwrap_or(&self.base_url)
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/api-token-auth/", self.root_url()),
            headers: vec![json_content_type()],
            body: Some(to_json(credentials)?),
        })
    }

    pub fn build_register(&self, registration: &Registration) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/register/", self.base_url),
            headers: vec![json_content_type()],
            body: Some(to_json(registration)?),
        })
    }

    pub fn build_list_countries(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/countries/", self.base_url),
            headers: vec![authorization(token)],
            body: None,
        }
    }

    pub fn build_list_statuses(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/country-statuses/", self.base_url),
            headers: vec![authorization(token)],
            body: None,
        }
    }

    pub fn build_create_status(
        &self,
        token: &str,
        input: &NewCountryStatus,
    ) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/country-statuses/", self.base_url),
            headers: vec![authorization(token), json_content_type()],
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update_status(
        &self,
        token: &str,
        status_id: i64,
        input: &NewCountryStatus,
    ) -> Result<HttpRequest, ClientError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/country-statuses/{status_id}/", self.base_url),
            headers: vec![authorization(token), json_content_type()],
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete_status(&self, token: &str, status_id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/country-statuses/{status_id}/", self.base_url),
            headers: vec![authorization(token)],
            body: None,
        }
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<String, ClientError> {
        check_auth_status(&response)?;
        let auth: AuthToken = from_json(&response.body)?;
        if auth.token.is_empty() {
            return Err(ClientError::Decoding("empty token in response".to_string()));
        }
        Ok(auth.token)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<(), ClientError> {
        check_auth_status(&response)
    }

    pub fn parse_list_countries(&self, response: HttpResponse) -> Result<Vec<Country>, ClientError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_list_statuses(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<CountryStatusRecord>, ClientError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_create_status(
        &self,
        response: HttpResponse,
    ) -> Result<CountryStatusRecord, ClientError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_update_status(
        &self,
        response: HttpResponse,
    ) -> Result<CountryStatusRecord, ClientError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    /// Delete failures are reported by status code only; the body is ignored.
    pub fn parse_delete_status(&self, response: HttpResponse) -> Result<(), ClientError> {
        if response.is_success() {
            return Ok(());
        }
        Err(ClientError::Api {
            status: response.status,
            message: None,
        })
    }
}

fn authorization(token: &str) -> (String, String) {
    ("authorization".to_string(), format!("Token {token}"))
}

fn json_content_type() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ClientError> {
    serde_json::to_string(value).map_err(|e| ClientError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Decoding(e.to_string()))
}

/// Map a non-2xx answer from a data endpoint to `ClientError::Api`.
fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ClientError::Api {
        status: response.status,
        message: server_message(&response.body),
    })
}

/// Map a non-2xx answer from the token or registration endpoint to
/// `ClientError::Auth`.
fn check_auth_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ClientError::Auth {
        status: response.status,
        message: None,
    })
}

/// Pull a human-readable explanation out of an error body.
///
/// Prefers an `error` string field, then a `detail` string field. Anything
/// else (empty body, HTML, field-keyed validation maps) yields `None`.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
