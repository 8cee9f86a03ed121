//! Absolute URL splitting for the HTTP client.
//!
//! # Design
//! Only the two schemes the client can speak are recognized. The split is
//! positional: the host runs to the first `/` or `:`, a `:` that precedes the
//! first `/` introduces a port, and the path is everything from the first `/`
//! on (query string included, nothing is decoded).
//!
//! Port text is read the way C's `atoi` reads it: leading decimal digits are
//! used and a port with no digits at all becomes `0`. Such a URL parses, and
//! the connect attempt fails later.

use std::fmt;

use crate::error::{Error, Result};

/// Longest host name accepted, in bytes.
pub const MAX_HOST_LEN: usize = 255;

/// Port text at or beyond this length is rejected outright.
const MAX_PORT_TEXT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn is_tls(self) -> bool {
        self == Scheme::Https
    }

    fn prefix(self) -> &'static str {
        match self {
            Scheme::Http => "http://",
            Scheme::Https => "https://",
        }
    }
}

/// An absolute URL split into the parts the transport needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ParsedUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            return Err(Error::MalformedUrl(format!("unsupported scheme in {url:?}")));
        };

        let slash = rest.find('/');
        let colon = rest.find(':');

        let path = match slash {
            Some(i) => rest[i..].to_string(),
            None => "/".to_string(),
        };

        let (host, port) = match colon {
            Some(c) if slash.map_or(true, |s| c < s) => {
                let port_text = &rest[c + 1..slash.unwrap_or(rest.len())];
                (&rest[..c], parse_port(port_text)?)
            }
            _ => (&rest[..slash.unwrap_or(rest.len())], scheme.default_port()),
        };

        if host.is_empty() {
            return Err(Error::MalformedUrl(format!("empty host in {url:?}")));
        }
        if host.len() > MAX_HOST_LEN {
            return Err(Error::MalformedUrl(format!(
                "host is {} bytes, limit is {MAX_HOST_LEN}",
                host.len()
            )));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path,
        })
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scheme.prefix(), self.host)?;
        if self.port != self.scheme.default_port() {
            write!(f, ":{}", self.port)?;
        }
        f.write_str(&self.path)
    }
}

fn parse_port(text: &str) -> Result<u16> {
    if text.len() >= MAX_PORT_TEXT_LEN {
        return Err(Error::MalformedUrl(format!("port {text:?} is too long")));
    }

    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: u32 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value * 10 + u32::from(b - b'0');
        if value > u32::from(u16::MAX) {
            return Err(Error::MalformedUrl(format!("port {text:?} is out of range")));
        }
    }
    if negative && value != 0 {
        return Err(Error::MalformedUrl(format!("port {text:?} is negative")));
    }
    Ok(value as u16)
}
