//! Transport and document core for a DNS-record API client.
//!
//! # Overview
//! Two pieces usually borrowed from larger libraries, kept small and
//! dependency-light:
//! - a blocking HTTP/1.1 client over raw TCP (rustls for HTTPS) that sends
//!   one request per connection and reads the reply to end of stream,
//!   decoding chunked bodies;
//! - a lazy JSON document model whose nested containers stay as raw text
//!   until a key search reaches them.
//!
//! # Design
//! - `HttpClient` holds only a `ClientConfig`. Every call opens, uses and
//!   closes its own `Channel`; no connection is reused.
//! - TLS client state is process-wide, built on first HTTPS use and released
//!   with `tls::shutdown`.
//! - A completed exchange is always `Ok(Response)`, whatever the status.
//!   `Error` is reserved for failures where no response exists.
//! - JSON parsing is best-effort: malformed input yields the entries read
//!   before the fault instead of an error.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod json;
pub mod response;
pub mod tls;
pub mod transport;
pub mod url;

pub use client::{request, HttpClient};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::{Headers, Method, Request, Response};
pub use url::{ParsedUrl, Scheme};
