//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! tagged enums with explicit discriminants. Optional integers travel as a
//! value plus a `has_*` flag. Conversion and release helpers live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use wmt_core::error::ClientError;
use wmt_core::http::HttpMethod;
use wmt_core::markers::MarkerSet;
use wmt_core::types::{Country, CountryMarker, CountryStatusRecord, StatusKind};

/// Opaque handle to a `WmtClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiWmtClient {
    pub(crate) inner: wmt_core::WmtClient,
}

/// Copy `s` into a heap C string. Interior NUL bytes truncate the value.
pub(crate) fn into_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    if let Some(nul) = bytes.iter().position(|b| *b == 0) {
        bytes.truncate(nul);
    }
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Release a string produced by `into_c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Move `items` to the heap as a boxed slice. Empty input yields null.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice produced by `into_raw_slice`.
fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `wmt_build_*` functions. The C caller executes the request
/// and passes the response back through `wmt_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: wmt_core::HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: into_c_string(k),
                value: into_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: into_c_string(req.path),
            headers,
            headers_len,
            body: req.body.map(into_c_string).unwrap_or(std::ptr::null_mut()),
        }))
    }

    pub(crate) fn release(self) {
        free_c_string(self.path);
        free_c_string(self.body);
        for header in from_raw_slice(self.headers, self.headers_len) {
            free_c_string(header.key);
            free_c_string(header.value);
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `wmt_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// Status of a country for the current user.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatusKind {
    Visited = 0,
    WantToVisit = 1,
}

impl From<StatusKind> for FfiStatusKind {
    fn from(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Visited => FfiStatusKind::Visited,
            StatusKind::WantToVisit => FfiStatusKind::WantToVisit,
        }
    }
}

/// Decode the integer status code C callers pass in.
pub(crate) fn status_from_code(code: i32) -> Option<StatusKind> {
    match code {
        0 => Some(StatusKind::Visited),
        1 => Some(StatusKind::WantToVisit),
        _ => None,
    }
}

#[repr(C)]
pub struct FfiCountry {
    pub id: i64,
    pub name: *mut c_char,
    pub iso_code: *mut c_char,
}

#[repr(C)]
pub struct FfiCountryList {
    pub items: *mut FfiCountry,
    pub len: u32,
}

/// One status record. `status` is the raw server value.
#[repr(C)]
pub struct FfiStatus {
    pub id: i64,
    pub has_id: bool,
    pub country: i64,
    /// Null when the server omitted the name.
    pub country_name: *mut c_char,
    pub status: *mut c_char,
    pub latitude: f64,
    pub longitude: f64,
}

#[repr(C)]
pub struct FfiMarker {
    pub name: *mut c_char,
    pub latitude: f64,
    pub longitude: f64,
    pub status: FfiStatusKind,
    pub country_id: i64,
    pub status_id: i64,
    pub has_status_id: bool,
}

#[repr(C)]
pub struct FfiMarkerList {
    pub items: *mut FfiMarker,
    pub len: u32,
}

/// Markers already partitioned into the two list views.
#[repr(C)]
pub struct FfiMarkerSet {
    pub visited: FfiMarkerList,
    pub want_to_visit: FfiMarkerList,
}

impl FfiCountry {
    fn from_core(country: Country) -> Self {
        Self {
            id: country.id,
            name: into_c_string(country.name),
            iso_code: into_c_string(country.iso_code),
        }
    }

    fn release(self) {
        free_c_string(self.name);
        free_c_string(self.iso_code);
    }
}

impl FfiStatus {
    fn from_core(record: CountryStatusRecord) -> Self {
        Self {
            id: record.id.unwrap_or(0),
            has_id: record.id.is_some(),
            country: record.country,
            country_name: record
                .country_name
                .map(into_c_string)
                .unwrap_or(std::ptr::null_mut()),
            status: into_c_string(record.status),
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }

    fn release(self) {
        free_c_string(self.country_name);
        free_c_string(self.status);
    }
}

impl FfiMarker {
    fn from_core(marker: CountryMarker) -> Self {
        Self {
            name: into_c_string(marker.name),
            latitude: marker.coordinate.latitude,
            longitude: marker.coordinate.longitude,
            status: marker.status.into(),
            country_id: marker.country_id,
            status_id: marker.status_id.unwrap_or(0),
            has_status_id: marker.status_id.is_some(),
        }
    }
}

impl FfiMarkerList {
    fn from_core(markers: Vec<CountryMarker>) -> Self {
        let (items, len) = into_raw_slice(markers.into_iter().map(FfiMarker::from_core).collect());
        Self { items, len }
    }

    fn release(self) {
        for marker in from_raw_slice(self.items, self.len) {
            free_c_string(marker.name);
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiWmtResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Auth = 2,
    Api = 3,
    Decoding = 4,
    Serialization = 5,
    Validation = 6,
    Storage = 7,
    Panic = 8,
    NullArg = 9,
}

/// Tag that tells `wmt_free_result` what `FfiWmtResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is a `char*` token.
    Token = 1,
    CountryList = 2,
    Status = 3,
    MarkerSet = 4,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiWmtResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiWmtResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiWmtResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn err(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiWmtResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result with no data payload (e.g. delete).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_token(token: String) -> *mut Self {
        Self::ok(FfiDataTag::Token, into_c_string(token) as *mut c_void)
    }

    pub(crate) fn ok_country_list(countries: Vec<Country>) -> *mut Self {
        let (items, len) = into_raw_slice(countries.into_iter().map(FfiCountry::from_core).collect());
        let list = Box::new(FfiCountryList { items, len });
        Self::ok(FfiDataTag::CountryList, Box::into_raw(list) as *mut c_void)
    }

    pub(crate) fn ok_status(record: CountryStatusRecord) -> *mut Self {
        let status = Box::new(FfiStatus::from_core(record));
        Self::ok(FfiDataTag::Status, Box::into_raw(status) as *mut c_void)
    }

    pub(crate) fn ok_marker_set(set: MarkerSet) -> *mut Self {
        let set = Box::new(FfiMarkerSet {
            visited: FfiMarkerList::from_core(set.visited),
            want_to_visit: FfiMarkerList::from_core(set.want_to_visit),
        });
        Self::ok(FfiDataTag::MarkerSet, Box::into_raw(set) as *mut c_void)
    }

    /// Build an error result from a `ClientError`.
    pub(crate) fn from_error(err: ClientError) -> *mut Self {
        let http_status = err.http_status().unwrap_or(0);
        let code = match &err {
            ClientError::Transport(_) => FfiErrorCode::Transport,
            ClientError::Auth { .. } => FfiErrorCode::Auth,
            ClientError::Api { .. } => FfiErrorCode::Api,
            ClientError::Decoding(_) => FfiErrorCode::Decoding,
            ClientError::Serialization(_) => FfiErrorCode::Serialization,
            ClientError::Validation(_) => FfiErrorCode::Validation,
            ClientError::Storage(_) => FfiErrorCode::Storage,
        };
        Self::err(code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::err(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::err(FfiErrorCode::Panic, 0, msg.to_string())
    }

    /// Free the payload according to `data_tag`, then the message.
    pub(crate) fn release(self) {
        free_c_string(self.error_message);
        if self.data.is_null() {
            return;
        }
        match self.data_tag {
            FfiDataTag::Token => free_c_string(self.data as *mut c_char),
            FfiDataTag::CountryList => {
                let list = unsafe { Box::from_raw(self.data as *mut FfiCountryList) };
                for country in from_raw_slice(list.items, list.len) {
                    country.release();
                }
            }
            FfiDataTag::Status => {
                let status = unsafe { Box::from_raw(self.data as *mut FfiStatus) };
                (*status).release();
            }
            FfiDataTag::MarkerSet => {
                let set = unsafe { Box::from_raw(self.data as *mut FfiMarkerSet) };
                let FfiMarkerSet {
                    visited,
                    want_to_visit,
                } = *set;
                visited.release();
                want_to_visit.release();
            }
            FfiDataTag::None => {}
        }
    }
}
