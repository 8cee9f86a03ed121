//! C-ABI wrapper around `ddns-core`.
//!
//! # Overview
//! Exposes the blocking HTTP(S) client and the lazy JSON document API
//! through `extern "C"` functions, so a C program can issue DNS-provider API
//! calls and pick values out of the replies without linking anything but
//! this library.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Header lists and documents are opaque handles; responses and value
//!   lists are plain `#[repr(C)]` structs the caller reads directly.
//! - The C caller owns all returned pointers and must release each with the
//!   matching `ddns_*_free` function.
//! - `ddns_http_request` reads its settings from the environment on every
//!   call (`DDNS_HTTP_TIMEOUT_SECS`, `DDNS_TLS_VERIFY`).

pub mod types;


use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::ptr;

use ddns_core::json::{self, Document, Object, Value};
use ddns_core::{tls, ClientConfig, Headers, HttpClient};

use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Create an empty header list.
///
/// The caller must free the returned pointer with `ddns_headers_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_headers_new() -> *mut FfiHeaders {
    catch_unwind(|| Box::into_raw(Box::new(FfiHeaders { inner: Headers::new() })))
        .unwrap_or(ptr::null_mut())
}

/// Append `name: value`. Headers are sent in the order they were added.
///
/// Returns false if any argument is null or not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_headers_add(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        if headers.is_null() {
            return false;
        }
        let (Some(name), Some(value)) = (unsafe { str_arg(name) }, unsafe { str_arg(value) })
        else {
            return false;
        };
        let headers = unsafe { &mut *headers };
        headers.inner.add(name, value);
        true
    })
    .unwrap_or(false)
}

/// Free a header list created by `ddns_headers_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_headers_free(headers: *mut FfiHeaders) {
    if !headers.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(headers) });
        });
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Perform one request/response exchange.
///
/// `body` may be null (no body is sent); otherwise `body_len` bytes are sent
/// with a `Content-Length`. `headers` may be null. Never returns null; check
/// `error_code` and free the result with `ddns_response_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_http_request(
    url: *const c_char,
    method: FfiHttpMethod,
    body: *const u8,
    body_len: usize,
    headers: *const FfiHeaders,
) -> *mut FfiHttpResponse {
    catch_unwind(|| {
        if url.is_null() {
            return FfiHttpResponse::failure(FfiErrorCode::NullArg, "null argument: url");
        }
        let Some(url) = (unsafe { str_arg(url) }) else {
            return FfiHttpResponse::failure(FfiErrorCode::InvalidUtf8, "url is not valid UTF-8");
        };
        let body = if body.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(body, body_len) })
        };
        let empty = Headers::new();
        let headers = if headers.is_null() {
            &empty
        } else {
            unsafe { &(*headers).inner }
        };

        let config = match ClientConfig::from_env() {
            Ok(config) => config,
            Err(e) => return FfiHttpResponse::from_error(e),
        };
        match HttpClient::new(config).request(url, method.into(), body, headers) {
            Ok(response) => FfiHttpResponse::from_core(response),
            Err(e) => FfiHttpResponse::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiHttpResponse::failure(FfiErrorCode::Panic, "panic in ddns_http_request"))
}

/// Free a response returned by `ddns_http_request`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_response_free(response: *mut FfiHttpResponse) {
    if response.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let response = unsafe { Box::from_raw(response) };
        unsafe {
            free_c_string(response.error_message);
            for header in from_raw_slice(response.headers, response.headers_len).iter() {
                free_c_string(header.name);
                free_c_string(header.value);
            }
            drop(from_raw_slice(response.body, response.body_len));
        }
    });
}

/// Release the shared TLS state. Later HTTPS requests rebuild it.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_http_cleanup() {
    let _ = catch_unwind(tls::shutdown);
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

/// Parse `text` leniently.
///
/// Returns null if `text` is null, not UTF-8, or does not start with an
/// object or array. Free the result with `ddns_json_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_parse(text: *const c_char) -> *mut FfiJsonDocument {
    catch_unwind(|| {
        let Some(text) = (unsafe { str_arg(text) }) else {
            return ptr::null_mut();
        };
        match json::parse(text) {
            Some(inner) => Box::into_raw(Box::new(FfiJsonDocument { inner })),
            None => ptr::null_mut(),
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a document. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_free(document: *mut FfiJsonDocument) {
    if !document.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(document) });
        });
    }
}

/// Render a document as compact JSON text.
///
/// Returns null if `document` is null. Free with `ddns_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_to_string(document: *const FfiJsonDocument) -> *mut c_char {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let document = unsafe { &*document };
        to_c_string(&json::to_string(&document.inner))
    })
    .unwrap_or(ptr::null_mut())
}

/// Number of top-level entries (object) or elements (array); 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_count(document: *const FfiJsonDocument) -> usize {
    catch_unwind(|| {
        if document.is_null() {
            return 0;
        }
        match unsafe { &(*document).inner } {
            Document::Object(object) => object.len(),
            Document::Array(array) => array.len(),
        }
    })
    .unwrap_or(0)
}

/// First top-level string stored under `key` in an object document.
///
/// Returns null when there is no such string. Free with `ddns_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_find_string(
    document: *const FfiJsonDocument,
    key: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(key) }) else {
            return ptr::null_mut();
        };
        let document = unsafe { &*document };
        match document.inner.as_object().and_then(|o| o.get(key)) {
            Some(Value::String(s)) => to_c_string(s),
            _ => ptr::null_mut(),
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_string_free(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// JSON key search
// ---------------------------------------------------------------------------

/// Every string under `key` at any depth. A nested object or array under
/// `key` is returned as its JSON text. Never returns null unless an
/// argument is null. Free with `ddns_string_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_get_string_values(
    document: *const FfiJsonDocument,
    key: *const c_char,
) -> *mut FfiStringList {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(key) }) else {
            return ptr::null_mut();
        };
        let document = unsafe { &*document };
        FfiStringList::from_core(json::get_string_values(&document.inner, key))
    })
    .unwrap_or(ptr::null_mut())
}

/// Every number under `key` at any depth. Free with `ddns_number_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_get_number_values(
    document: *const FfiJsonDocument,
    key: *const c_char,
) -> *mut FfiNumberList {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(key) }) else {
            return ptr::null_mut();
        };
        let document = unsafe { &*document };
        FfiNumberList::from_core(json::get_number_values(&document.inner, key))
    })
    .unwrap_or(ptr::null_mut())
}

/// Every boolean under `key` at any depth. Free with `ddns_bool_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_get_boolean_values(
    document: *const FfiJsonDocument,
    key: *const c_char,
) -> *mut FfiBoolList {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(key) }) else {
            return ptr::null_mut();
        };
        let document = unsafe { &*document };
        FfiBoolList::from_core(json::get_boolean_values(&document.inner, key))
    })
    .unwrap_or(ptr::null_mut())
}

/// One `true` per `null` under `key` at any depth. Free with
/// `ddns_bool_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_get_null_values(
    document: *const FfiJsonDocument,
    key: *const c_char,
) -> *mut FfiBoolList {
    catch_unwind(|| {
        if document.is_null() {
            return ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(key) }) else {
            return ptr::null_mut();
        };
        let document = unsafe { &*document };
        FfiBoolList::from_core(json::get_null_values(&document.inner, key))
    })
    .unwrap_or(ptr::null_mut())
}

/// Free a list from `ddns_json_get_string_values`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_string_list_free(list: *mut FfiStringList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let list = unsafe { Box::from_raw(list) };
        for &item in unsafe { from_raw_slice(list.items, list.len) }.iter() {
            unsafe { free_c_string(item) };
        }
    });
}

/// Free a list from `ddns_json_get_number_values`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_number_list_free(list: *mut FfiNumberList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let list = unsafe { Box::from_raw(list) };
        drop(unsafe { from_raw_slice(list.items, list.len) });
    });
}

/// Free a list from `ddns_json_get_boolean_values` or
/// `ddns_json_get_null_values`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_bool_list_free(list: *mut FfiBoolList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let list = unsafe { Box::from_raw(list) };
        drop(unsafe { from_raw_slice(list.items, list.len) });
    });
}

// ---------------------------------------------------------------------------
// JSON object building
// ---------------------------------------------------------------------------

/// Create a document holding an empty object. Free with `ddns_json_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_new() -> *mut FfiJsonDocument {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiJsonDocument {
            inner: Document::Object(Object::new()),
        }))
    })
    .unwrap_or(ptr::null_mut())
}

/// Append `key: value` to an object document. Returns false if the document
/// is null or an array, or `key` is null or not UTF-8.
///
/// # Safety
/// `document` must be null or a live handle from `ddns_json_parse` or
/// `ddns_json_object_new` with no other reference to it. `key` must satisfy
/// `str_arg`.
unsafe fn add_entry(document: *mut FfiJsonDocument, key: *const c_char, value: Value) -> bool {
    if document.is_null() {
        return false;
    }
    let Some(key) = (unsafe { str_arg(key) }) else {
        return false;
    };
    let document = unsafe { &mut *document };
    match document.inner.as_object_mut() {
        Some(object) => {
            object.push(key, value);
            true
        }
        None => false,
    }
}

/// Append a string entry. `value` is stored as given, without escaping.
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_string(
    document: *mut FfiJsonDocument,
    key: *const c_char,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        let Some(value) = (unsafe { str_arg(value) }) else {
            return false;
        };
        unsafe { add_entry(document, key, Value::String(value.to_string())) }
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_number(
    document: *mut FfiJsonDocument,
    key: *const c_char,
    value: f64,
) -> bool {
    catch_unwind(|| unsafe { add_entry(document, key, Value::Number(value)) }).unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_boolean(
    document: *mut FfiJsonDocument,
    key: *const c_char,
    value: bool,
) -> bool {
    catch_unwind(|| unsafe { add_entry(document, key, Value::Bool(value)) }).unwrap_or(false)
}

#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_null(
    document: *mut FfiJsonDocument,
    key: *const c_char,
) -> bool {
    catch_unwind(|| unsafe { add_entry(document, key, Value::Null) }).unwrap_or(false)
}

/// Append an empty nested object (`{}`).
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_empty_object(
    document: *mut FfiJsonDocument,
    key: *const c_char,
) -> bool {
    catch_unwind(|| unsafe { add_entry(document, key, Value::empty_object()) }).unwrap_or(false)
}

/// Append an empty nested array (`[]`).
#[unsafe(no_mangle)]
pub extern "C" fn ddns_json_object_add_empty_array(
    document: *mut FfiJsonDocument,
    key: *const c_char,
) -> bool {
    catch_unwind(|| unsafe { add_entry(document, key, Value::empty_array()) }).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn take_string(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let text = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
        ddns_string_free(s);
        text
    }

    #[test]
    fn headers_new_add_free() {
        let headers = ddns_headers_new();
        assert!(!headers.is_null());
        assert!(ddns_headers_add(headers, c("Accept").as_ptr(), c("*/*").as_ptr()));
        assert!(!ddns_headers_add(headers, ptr::null(), c("x").as_ptr()));
        assert_eq!(unsafe { &(*headers).inner }.len(), 1);
        ddns_headers_free(headers);
    }

    #[test]
    fn frees_accept_null() {
        ddns_headers_free(ptr::null_mut());
        ddns_response_free(ptr::null_mut());
        ddns_json_free(ptr::null_mut());
        ddns_string_free(ptr::null_mut());
        ddns_string_list_free(ptr::null_mut());
        ddns_number_list_free(ptr::null_mut());
        ddns_bool_list_free(ptr::null_mut());
    }

    #[test]
    fn request_with_null_url() {
        let response = ddns_http_request(ptr::null(), FfiHttpMethod::Get, ptr::null(), 0, ptr::null());
        let r = unsafe { &*response };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert!(r.body.is_null());
        ddns_response_free(response);
    }

    #[test]
    fn request_with_malformed_url() {
        let url = c("ftp://example.com/");
        let response = ddns_http_request(url.as_ptr(), FfiHttpMethod::Get, ptr::null(), 0, ptr::null());
        let r = unsafe { &*response };
        assert_eq!(r.error_code, FfiErrorCode::MalformedUrl);
        let message = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(message.starts_with("malformed URL"));
        ddns_response_free(response);
    }

    #[test]
    fn parse_query_and_free() {
        let doc = ddns_json_parse(c(r#"{"result":[{"content":"179.24.91.14","ttl":1}],"success":true,"x":null}"#).as_ptr());
        assert!(!doc.is_null());
        assert_eq!(ddns_json_count(doc), 3);

        let strings = ddns_json_get_string_values(doc, c("content").as_ptr());
        let list = unsafe { &*strings };
        assert_eq!(list.len, 1);
        let first = unsafe { CStr::from_ptr(*list.items) }.to_str().unwrap();
        assert_eq!(first, "179.24.91.14");
        ddns_string_list_free(strings);

        let numbers = ddns_json_get_number_values(doc, c("ttl").as_ptr());
        assert_eq!(unsafe { std::slice::from_raw_parts((*numbers).items, (*numbers).len) }, [1.0]);
        ddns_number_list_free(numbers);

        let bools = ddns_json_get_boolean_values(doc, c("success").as_ptr());
        assert_eq!(unsafe { std::slice::from_raw_parts((*bools).items, (*bools).len) }, [true]);
        ddns_bool_list_free(bools);

        let nulls = ddns_json_get_null_values(doc, c("x").as_ptr());
        assert_eq!(unsafe { (*nulls).len }, 1);
        ddns_bool_list_free(nulls);

        let missing = ddns_json_get_string_values(doc, c("nope").as_ptr());
        assert_eq!(unsafe { (*missing).len }, 0);
        assert!(unsafe { (*missing).items }.is_null());
        ddns_string_list_free(missing);

        ddns_json_free(doc);
    }

    #[test]
    fn parse_rejects_non_documents() {
        assert!(ddns_json_parse(ptr::null()).is_null());
        assert!(ddns_json_parse(c("42").as_ptr()).is_null());
        assert!(ddns_json_get_string_values(ptr::null(), c("k").as_ptr()).is_null());
    }

    #[test]
    fn build_update_body() {
        let doc = ddns_json_object_new();
        assert!(ddns_json_object_add_string(doc, c("name").as_ptr(), c("home.example.com").as_ptr()));
        assert!(ddns_json_object_add_number(doc, c("ttl").as_ptr(), 3600.0));
        assert!(ddns_json_object_add_boolean(doc, c("proxied").as_ptr(), true));
        assert!(ddns_json_object_add_null(doc, c("comment").as_ptr()));
        assert!(ddns_json_object_add_empty_object(doc, c("meta").as_ptr()));
        assert!(ddns_json_object_add_empty_array(doc, c("tags").as_ptr()));
        assert_eq!(ddns_json_count(doc), 6);

        assert_eq!(
            take_string(ddns_json_to_string(doc)),
            r#"{"name":"home.example.com","ttl":3600,"proxied":true,"comment":null,"meta":{},"tags":[]}"#
        );
        assert_eq!(take_string(ddns_json_find_string(doc, c("name").as_ptr())), "home.example.com");
        assert!(ddns_json_find_string(doc, c("ttl").as_ptr()).is_null());
        ddns_json_free(doc);
    }

    #[test]
    fn cannot_add_to_array_document() {
        let doc = ddns_json_parse(c("[1,2]").as_ptr());
        assert!(!ddns_json_object_add_number(doc, c("k").as_ptr(), 1.0));
        assert_eq!(ddns_json_count(doc), 2);
        ddns_json_free(doc);
    }

    #[test]
    fn add_rejects_null_handles() {
        assert!(!ddns_json_object_add_null(ptr::null_mut(), c("k").as_ptr()));
        let doc = ddns_json_object_new();
        assert!(!ddns_json_object_add_boolean(doc, ptr::null(), true));
        assert_eq!(ddns_json_count(doc), 0);
        ddns_json_free(doc);
    }

    #[test]
    fn string_query_returns_container_text() {
        let doc = ddns_json_parse(c(r#"{"result":[{"content":"179.24.91.14"}],"errors":[]}"#).as_ptr());
        let strings = ddns_json_get_string_values(doc, c("result").as_ptr());
        let list = unsafe { &*strings };
        assert_eq!(list.len, 1);
        let first = unsafe { CStr::from_ptr(*list.items) }.to_str().unwrap();
        assert_eq!(first, r#"[{"content":"179.24.91.14"}]"#);
        ddns_string_list_free(strings);
        ddns_json_free(doc);
    }
}
