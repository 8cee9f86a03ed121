//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Opaque handles wrap core values the C side never looks into (header
//! lists, documents). Everything the C side reads directly is plain data:
//! `*mut c_char` for text, pointer plus length for byte buffers and value
//! lists, explicit discriminants for enums. Buffers are handed out as boxed
//! slices so they can be released from the pointer and length alone.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

use ddns_core::error::Error;
use ddns_core::http::{Headers, Method, Response};
use ddns_core::json::Document;

/// Opaque ordered header list. Created by `ddns_headers_new`.
pub struct FfiHeaders {
    pub(crate) inner: Headers,
}

/// Opaque parsed or built JSON document. Created by `ddns_json_parse` or
/// `ddns_json_object_new`.
pub struct FfiJsonDocument {
    pub(crate) inner: Document,
}

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<FfiHttpMethod> for Method {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => Method::Get,
            FfiHttpMethod::Post => Method::Post,
            FfiHttpMethod::Put => Method::Put,
            FfiHttpMethod::Delete => Method::Delete,
        }
    }
}

/// Error codes returned in `FfiHttpResponse`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MalformedUrl = 1,
    Transport = 2,
    Config = 3,
    NullArg = 4,
    InvalidUtf8 = 5,
    Panic = 6,
}

/// A single response header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// Outcome of `ddns_http_request`.
///
/// With `error_code == Ok` the exchange completed: `status` holds the HTTP
/// status (any value, 4xx/5xx included) and `body`/`body_len` the decoded
/// body, which may contain NUL bytes. Otherwise `error_message` describes
/// the failure and the other pointers are null.
#[repr(C)]
pub struct FfiHttpResponse {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status: u16,
    pub headers: *mut FfiHeader,
    pub headers_len: usize,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    pub(crate) fn from_core(response: Response) -> *mut Self {
        let headers: Vec<FfiHeader> = response
            .headers
            .iter()
            .map(|(name, value)| FfiHeader {
                name: to_c_string(name),
                value: to_c_string(value),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);
        let (body, body_len) = into_raw_slice(response.body);

        Box::into_raw(Box::new(FfiHttpResponse {
            error_code: FfiErrorCode::Ok,
            error_message: ptr::null_mut(),
            status: response.status,
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    pub(crate) fn from_error(err: Error) -> *mut Self {
        let code = match err {
            Error::MalformedUrl(_) => FfiErrorCode::MalformedUrl,
            Error::Transport(_) => FfiErrorCode::Transport,
            Error::Config(_) => FfiErrorCode::Config,
        };
        Self::failure(code, &err.to_string())
    }

    pub(crate) fn failure(error_code: FfiErrorCode, message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiHttpResponse {
            error_code,
            error_message: to_c_string(message),
            status: 0,
            headers: ptr::null_mut(),
            headers_len: 0,
            body: ptr::null_mut(),
            body_len: 0,
        }))
    }
}

/// Strings found by a key search, in document order.
#[repr(C)]
pub struct FfiStringList {
    pub items: *mut *mut c_char,
    pub len: usize,
}

/// Numbers found by a key search, in document order.
#[repr(C)]
pub struct FfiNumberList {
    pub items: *mut f64,
    pub len: usize,
}

/// Booleans (or null-presence flags) found by a key search.
#[repr(C)]
pub struct FfiBoolList {
    pub items: *mut bool,
    pub len: usize,
}

impl FfiStringList {
    pub(crate) fn from_core(values: Vec<String>) -> *mut Self {
        let items: Vec<*mut c_char> = values.iter().map(|s| to_c_string(s)).collect();
        let (items, len) = into_raw_slice(items);
        Box::into_raw(Box::new(FfiStringList { items, len }))
    }
}

impl FfiNumberList {
    pub(crate) fn from_core(values: Vec<f64>) -> *mut Self {
        let (items, len) = into_raw_slice(values);
        Box::into_raw(Box::new(FfiNumberList { items, len }))
    }
}

impl FfiBoolList {
    pub(crate) fn from_core(values: Vec<bool>) -> *mut Self {
        let (items, len) = into_raw_slice(values);
        Box::into_raw(Box::new(FfiBoolList { items, len }))
    }
}

// ---------------------------------------------------------------------------
// Ownership helpers
// ---------------------------------------------------------------------------

/// Heap C string owned by the caller. Interior NUL bytes are dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Leak `items` as a boxed slice; null for an empty vector.
pub(crate) fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, usize) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = items.len();
    let slice = Box::into_raw(items.into_boxed_slice());
    (slice.cast::<T>(), len)
}

/// Reclaim a slice leaked by `into_raw_slice`.
///
/// # Safety
/// `items` and `len` must come from one `into_raw_slice` call and must not
/// be reclaimed twice.
pub(crate) unsafe fn from_raw_slice<T>(items: *mut T, len: usize) -> Box<[T]> {
    if items.is_null() || len == 0 {
        return Box::new([]);
    }
    unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(items, len)) }
}

/// Release a C string produced by `to_c_string`. Null is ignored.
///
/// # Safety
/// `s` must come from `to_c_string` and must not be released twice.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
