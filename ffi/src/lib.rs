//! C-ABI wrapper around `wmt-core`.
//!
//! # Overview
//! Exposes the tracker API through `extern "C"` functions so a native mobile
//! shell can build requests and parse responses without linking to Rust's
//! networking stack or serde directly. The shell performs the HTTP call with
//! its own platform client and keeps the session token in its own keychain.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-endpoint `build_*` / `parse_*` mirrors the core API 1:1.
//! - `wmt_parse_list_statuses` returns markers already split into the
//!   visited and want-to-visit lists.
//! - A single `FfiWmtResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `wmt_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use wmt_core::error::ClientError;
use wmt_core::http::HttpResponse;
use wmt_core::markers::partition_markers;
use wmt_core::types::{Credentials, NewCountryStatus, Registration};
use wmt_core::WmtClient;

use types::*;

/// Read a C string argument. Null or non-UTF-8 input yields `None`.
fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .ok()
        .map(str::to_string)
}

/// Borrow the client behind `client`, or `None` when null.
fn client_ref<'a>(client: *const FfiWmtClient) -> Option<&'a WmtClient> {
    if client.is_null() {
        return None;
    }
    Some(&unsafe { &*client }.inner)
}

/// Run a request builder, mapping any failure or panic to null.
fn build(f: impl FnOnce() -> Option<wmt_core::HttpRequest>) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| match f() {
        Some(req) => FfiHttpRequest::from_core(req),
        None => std::ptr::null_mut(),
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Run a response parser inside the common null checks and panic guard.
fn parse<T>(
    name: &str,
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
    parser: impl FnOnce(&WmtClient, HttpResponse) -> Result<T, ClientError>,
    wrap: impl FnOnce(T) -> *mut FfiWmtResult,
) -> *mut FfiWmtResult {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(client) = client_ref(client) else {
            return FfiWmtResult::null_arg("client");
        };
        if response.is_null() {
            return FfiWmtResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        match parser(client, ffi_response_to_core(resp)) {
            Ok(value) => wrap(value),
            Err(e) => FfiWmtResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiWmtResult::panic(&format!("panic in {name}")))
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, read_str(resp.body).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client bound to the API base URL (e.g. `http://host:8000/api`).
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `wmt_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_client_new(base_url: *const c_char) -> *mut FfiWmtClient {
    catch_unwind(|| match read_str(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiWmtClient {
            inner: WmtClient::new(&url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `wmt_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_client_free(client: *mut FfiWmtClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the token request. Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_login(
    client: *const FfiWmtClient,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let credentials = Credentials {
            username: read_str(username)?,
            password: read_str(password)?,
        };
        client_ref(client)?.build_login(&credentials).ok()
    })
}

/// Build the registration request. Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_register(
    client: *const FfiWmtClient,
    username: *const c_char,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| {
        let registration = Registration {
            username: read_str(username)?,
            email: read_str(email)?,
            password: read_str(password)?,
        };
        client_ref(client)?.build_register(&registration).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_list_countries(
    client: *const FfiWmtClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| Some(client_ref(client)?.build_list_countries(&read_str(token)?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_list_statuses(
    client: *const FfiWmtClient,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    build(|| Some(client_ref(client)?.build_list_statuses(&read_str(token)?)))
}

/// Build a create-status request.
///
/// `status` is 0 for visited, 1 for want-to-visit. Returns null for any other
/// value or a null argument.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_create_status(
    client: *const FfiWmtClient,
    token: *const c_char,
    country_id: i64,
    status: i32,
    latitude: f64,
    longitude: f64,
) -> *mut FfiHttpRequest {
    build(|| {
        let input = NewCountryStatus {
            country: country_id,
            status: status_from_code(status)?,
            latitude,
            longitude,
        };
        client_ref(client)?
            .build_create_status(&read_str(token)?, &input)
            .ok()
    })
}

/// Build an update-status request. `status` follows `wmt_build_create_status`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_update_status(
    client: *const FfiWmtClient,
    token: *const c_char,
    status_id: i64,
    country_id: i64,
    status: i32,
    latitude: f64,
    longitude: f64,
) -> *mut FfiHttpRequest {
    build(|| {
        let input = NewCountryStatus {
            country: country_id,
            status: status_from_code(status)?,
            latitude,
            longitude,
        };
        client_ref(client)?
            .build_update_status(&read_str(token)?, status_id, &input)
            .ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn wmt_build_delete_status(
    client: *const FfiWmtClient,
    token: *const c_char,
    status_id: i64,
) -> *mut FfiHttpRequest {
    build(|| Some(client_ref(client)?.build_delete_status(&read_str(token)?, status_id)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse the token response. `data_tag = Token`, `data` is a `char*`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_login(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_login",
        client,
        response,
        |c, r| c.parse_login(r),
        FfiWmtResult::ok_token,
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_register(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_register",
        client,
        response,
        |c, r| c.parse_register(r),
        |()| FfiWmtResult::ok_empty(),
    )
}

/// Parse the country list. `data_tag = CountryList`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_list_countries(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_list_countries",
        client,
        response,
        |c, r| c.parse_list_countries(r),
        FfiWmtResult::ok_country_list,
    )
}

/// Parse the status list into partitioned markers. `data_tag = MarkerSet`.
///
/// Records with a status other than visited / want-to-visit are dropped.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_list_statuses(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_list_statuses",
        client,
        response,
        |c, r| c.parse_list_statuses(r),
        |records| FfiWmtResult::ok_marker_set(partition_markers(&records)),
    )
}

/// Parse a create-status response. `data_tag = Status`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_create_status(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_create_status",
        client,
        response,
        |c, r| c.parse_create_status(r),
        FfiWmtResult::ok_status,
    )
}

/// Parse an update-status response. `data_tag = Status`.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_update_status(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_update_status",
        client,
        response,
        |c, r| c.parse_update_status(r),
        FfiWmtResult::ok_status,
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn wmt_parse_delete_status(
    client: *const FfiWmtClient,
    response: *const FfiHttpResponse,
) -> *mut FfiWmtResult {
    parse(
        "wmt_parse_delete_status",
        client,
        response,
        |c, r| c.parse_delete_status(r),
        |()| FfiWmtResult::ok_empty(),
    )
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `wmt_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        req.release();
    });
}

/// Free an `FfiWmtResult` returned by any `wmt_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_free_result(result: *mut FfiWmtResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        result.release();
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wmt_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_client() -> *mut FfiWmtClient {
        let url = CString::new("http://localhost:8000/api").unwrap();
        wmt_client_new(url.as_ptr())
    }

    fn c_str(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn header(req: &FfiHttpRequest, index: usize) -> (String, String) {
        let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
        (c_str(headers[index].key), c_str(headers[index].value))
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        assert!(!client.is_null());
        wmt_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        assert!(wmt_client_new(std::ptr::null()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        wmt_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_login_targets_root() {
        let client = new_client();
        let user = CString::new("ana").unwrap();
        let pass = CString::new("pw").unwrap();
        let req = wmt_build_login(client, user.as_ptr(), pass.as_ptr());
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Post));
        assert_eq!(c_str(req_ref.path), "http://localhost:8000/api-token-auth/");
        assert_eq!(req_ref.headers_len, 1);
        let body: serde_json::Value = serde_json::from_str(&c_str(req_ref.body)).unwrap();
        assert_eq!(body["username"], "ana");

        wmt_free_request(req);
        wmt_client_free(client);
    }

    #[test]
    fn build_login_null_password_returns_null() {
        let client = new_client();
        let user = CString::new("ana").unwrap();
        assert!(wmt_build_login(client, user.as_ptr(), std::ptr::null()).is_null());
        wmt_client_free(client);
    }

    #[test]
    fn build_list_statuses_carries_token() {
        let client = new_client();
        let token = CString::new("t0k").unwrap();
        let req = wmt_build_list_statuses(client, token.as_ptr());
        let req_ref = unsafe { &*req };

        assert!(matches!(req_ref.method, FfiHttpMethod::Get));
        assert_eq!(c_str(req_ref.path), "http://localhost:8000/api/country-statuses/");
        assert_eq!(
            header(req_ref, 0),
            ("authorization".to_string(), "Token t0k".to_string())
        );
        assert!(req_ref.body.is_null());

        wmt_free_request(req);
        wmt_client_free(client);
    }

    #[test]
    fn build_list_null_client_returns_null() {
        let token = CString::new("t0k").unwrap();
        assert!(wmt_build_list_countries(std::ptr::null(), token.as_ptr()).is_null());
    }

    #[test]
    fn build_create_status_produces_json_body() {
        let client = new_client();
        let token = CString::new("t0k").unwrap();
        let req = wmt_build_create_status(client, token.as_ptr(), 2, 1, 35.6, 139.7);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Post));
        assert_eq!(req_ref.headers_len, 2);
        let body: serde_json::Value = serde_json::from_str(&c_str(req_ref.body)).unwrap();
        assert_eq!(body["country"], 2);
        assert_eq!(body["status"], "want_to_visit");

        wmt_free_request(req);
        wmt_client_free(client);
    }

    #[test]
    fn build_create_status_rejects_unknown_status_code() {
        let client = new_client();
        let token = CString::new("t0k").unwrap();
        let req = wmt_build_create_status(client, token.as_ptr(), 2, 7, 0.0, 0.0);
        assert!(req.is_null());
        wmt_client_free(client);
    }

    #[test]
    fn build_update_and_delete_address_record() {
        let client = new_client();
        let token = CString::new("t0k").unwrap();

        let req = wmt_build_update_status(client, token.as_ptr(), 5, 2, 0, 35.6, 139.7);
        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Put));
        assert_eq!(c_str(req_ref.path), "http://localhost:8000/api/country-statuses/5/");
        wmt_free_request(req);

        let req = wmt_build_delete_status(client, token.as_ptr(), 5);
        let req_ref = unsafe { &*req };
        assert!(matches!(req_ref.method, FfiHttpMethod::Delete));
        assert_eq!(c_str(req_ref.path), "http://localhost:8000/api/country-statuses/5/");
        wmt_free_request(req);

        wmt_client_free(client);
    }

    #[test]
    fn parse_login_returns_token() {
        let client = new_client();
        let body = CString::new(r#"{"token":"t0k"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_login(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Token);
        assert_eq!(c_str(r.data as *const c_char), "t0k");

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_login_rejected_is_auth() {
        let client = new_client();
        let body = CString::new(r#"{"non_field_errors":["nope"]}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        let result = wmt_parse_login(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Auth);
        assert_eq!(r.http_status, 400);
        assert_eq!(c_str(r.error_message), "Server error: 400");

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_list_countries_two_items() {
        let client = new_client();
        let body = CString::new(
            r#"[{"id":1,"name":"France","iso_code":"FRA"},{"id":2,"name":"Japan","iso_code":"JPN"}]"#,
        )
        .unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_list_countries(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.data_tag, FfiDataTag::CountryList);

        let list = unsafe { &*(r.data as *const FfiCountryList) };
        assert_eq!(list.len, 2);
        let items = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) };
        assert_eq!(items[1].id, 2);
        assert_eq!(c_str(items[1].name), "Japan");
        assert_eq!(c_str(items[1].iso_code), "JPN");

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_list_statuses_partitions_markers() {
        let client = new_client();
        let body = CString::new(
            r#"[
                {"id":1,"country":1,"country_name":"France","status":"visited","latitude":48.8,"longitude":2.3},
                {"id":2,"country":2,"country_name":"Japan","status":"want_to_visit","latitude":35.6,"longitude":139.7},
                {"id":3,"country":3,"country_name":"Peru","status":"lived_in","latitude":0.0,"longitude":0.0}
            ]"#,
        )
        .unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_list_statuses(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::MarkerSet);

        let set = unsafe { &*(r.data as *const FfiMarkerSet) };
        assert_eq!(set.visited.len, 1);
        assert_eq!(set.want_to_visit.len, 1);
        let visited = unsafe { std::slice::from_raw_parts(set.visited.items, 1) };
        assert_eq!(c_str(visited[0].name), "France");
        assert_eq!(visited[0].status, FfiStatusKind::Visited);
        assert!(visited[0].has_status_id);
        assert_eq!(visited[0].status_id, 1);
        let wanted = unsafe { std::slice::from_raw_parts(set.want_to_visit.items, 1) };
        assert_eq!(c_str(wanted[0].name), "Japan");

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_list_statuses_empty() {
        let client = new_client();
        let body = CString::new("[]").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_list_statuses(client, &resp);
        let r = unsafe { &*result };
        let set = unsafe { &*(r.data as *const FfiMarkerSet) };
        assert_eq!(set.visited.len, 0);
        assert!(set.visited.items.is_null());

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_create_status_duplicate_uses_server_message() {
        let client = new_client();
        let body = CString::new(r#"{"error":"You already marked France"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        let result = wmt_parse_create_status(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Api);
        assert_eq!(r.http_status, 400);
        assert_eq!(c_str(r.error_message), "You already marked France");
        assert!(r.data.is_null());

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_update_status_success() {
        let client = new_client();
        let body = CString::new(
            r#"{"id":4,"country":2,"status":"visited","latitude":1.0,"longitude":2.0}"#,
        )
        .unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_update_status(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.data_tag, FfiDataTag::Status);
        let status = unsafe { &*(r.data as *const FfiStatus) };
        assert!(status.has_id);
        assert_eq!(status.id, 4);
        assert!(status.country_name.is_null());
        assert_eq!(c_str(status.status), "visited");

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_delete_status_success() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 204,
            body: std::ptr::null(),
        };
        let result = wmt_parse_delete_status(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::None);
        assert!(r.data.is_null());

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_register_failure_is_auth() {
        let client = new_client();
        let body = CString::new("{}").unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        let result = wmt_parse_register(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Auth);

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let body = CString::new("[]").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = wmt_parse_list_countries(std::ptr::null(), &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        wmt_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client();
        let result = wmt_parse_list_statuses(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        wmt_free_result(result);
        wmt_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        wmt_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        wmt_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        wmt_free_string(std::ptr::null_mut());
    }
}
