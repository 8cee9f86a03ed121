//! Error types for the transport/document core.
//!
//! # Design
//! Only failures that prevent a response from existing at all are errors.
//! A completed exchange with a non-2xx status is an `Ok(Response)`, a response
//! missing its header/body boundary degrades to an empty body, and malformed
//! JSON yields a partial document. Callers that need to tell those apart look
//! at `Response::succeeded` or `Parser::is_complete`.

use thiserror::Error;

/// Errors returned by the HTTP client and its configuration layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The URL has an unknown scheme, an empty or oversized host, or an
    /// unusable port. Raised before any socket is opened.
    #[error("malformed URL: {0}")]
    MalformedUrl(String),

    /// Resolution, connect, TLS handshake or write failed, or the peer closed
    /// the connection without sending a single byte.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn transport(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Transport(format!("{context}: {err}"))
    }
}
