//! Response reading, splitting and chunked-body decoding.
//!
//! # Design
//! The reader drains the connection until the peer closes it (or the socket
//! timeout fires) and only then looks at the bytes. There is no
//! `Content-Length` early exit, which limits the transport to servers that
//! close after responding.
//!
//! Parsing degrades instead of failing. A missing header/body boundary gives
//! an empty body, and a malformed or truncated chunk stream keeps whatever
//! decoded cleanly before the damage. Only a connection that produced no
//! bytes at all is an error.

use std::io::{self, Read};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::http::{Headers, Response};

const CHUNKED_MARKER: &[u8] = b"transfer-encoding: chunked";

/// Read until end of stream and parse what arrived.
pub fn read_response<R: Read>(reader: &mut R, buffer_size: usize) -> Result<Response> {
    let raw = read_to_close(reader, buffer_size);
    if raw.is_empty() {
        return Err(Error::Transport(
            "connection closed before any response bytes arrived".to_string(),
        ));
    }
    trace!(bytes = raw.len(), "response received");
    Ok(parse_response(&raw))
}

/// Accumulate reads of at most `buffer_size` bytes until a zero-length read
/// or an error. Errors, timeouts included, end the stream silently.
pub fn read_to_close<R: Read>(reader: &mut R, buffer_size: usize) -> Vec<u8> {
    let mut received = Vec::new();
    let mut buf = vec![0u8; buffer_size.max(1)];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, received = received.len(), "read stopped, treating as end of response");
                break;
            }
        }
    }
    received
}

/// Split raw response bytes into status, headers and decoded body.
pub fn parse_response(raw: &[u8]) -> Response {
    let status = parse_status(raw);

    let Some((head_end, body_start)) = find_boundary(raw) else {
        warn!(status, bytes = raw.len(), "no header/body boundary, body left empty");
        return Response {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        };
    };

    let headers = parse_headers(&raw[..head_end]);
    let payload = &raw[body_start..];
    let body = if is_chunked(raw) {
        decode_chunked(payload)
    } else {
        payload.to_vec()
    };

    Response {
        status,
        headers,
        body,
    }
}

/// Concatenate the payloads of `<hex-size>\r\n<data>\r\n` chunks up to the
/// zero-size terminator.
///
/// A size line that is not hexadecimal ends decoding and the chunks after it
/// are dropped. A chunk cut short by end of input contributes the bytes that
/// are present.
pub fn decode_chunked(mut input: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    loop {
        let Some(line_end) = find(input, b"\r\n") else {
            break;
        };
        let size = match parse_chunk_size(&input[..line_end]) {
            Some(0) => break,
            Some(size) => size,
            None => {
                debug!(
                    line = %String::from_utf8_lossy(&input[..line_end]),
                    "malformed chunk size, dropping remaining chunks"
                );
                break;
            }
        };

        let data = &input[line_end + 2..];
        if data.len() < size {
            debug!(expected = size, available = data.len(), "chunk truncated");
            decoded.extend_from_slice(data);
            break;
        }
        decoded.extend_from_slice(&data[..size]);
        input = data.get(size + 2..).unwrap_or_default();
    }
    decoded
}

/// Status code from the first line: leading digits of the text between the
/// first and second space, or after the first space when there is no second.
/// `0` when nothing numeric is there.
fn parse_status(raw: &[u8]) -> u16 {
    let start = raw
        .iter()
        .position(|&b| b != b'\r' && b != b'\n')
        .unwrap_or(raw.len());
    let rest = &raw[start..];
    let line = &rest[..rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len())];

    let Some(first_space) = line.iter().position(|&b| b == b' ') else {
        return 0;
    };
    let after = &line[first_space + 1..];
    let code = &after[..after.iter().position(|&b| b == b' ').unwrap_or(after.len())];

    let mut value: u32 = 0;
    for &b in code.iter().take_while(|b| b.is_ascii_digit()) {
        value = value * 10 + u32::from(b - b'0');
        if value > u32::from(u16::MAX) {
            return 0;
        }
    }
    value as u16
}

/// `(end of headers, start of body)` for the first `\r\n\r\n`, falling back
/// to the first bare `\n\n`.
fn find_boundary(raw: &[u8]) -> Option<(usize, usize)> {
    if let Some(i) = find(raw, b"\r\n\r\n") {
        return Some((i, i + 4));
    }
    find(raw, b"\n\n").map(|i| (i, i + 2))
}

fn parse_headers(head: &[u8]) -> Headers {
    String::from_utf8_lossy(head)
        .split('\n')
        .skip(1)
        .filter_map(|line| {
            let (name, value) = line.trim_end_matches('\r').split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

// The marker is searched over the whole response, headers and body alike.
fn is_chunked(raw: &[u8]) -> bool {
    raw.windows(CHUNKED_MARKER.len())
        .any(|w| w.eq_ignore_ascii_case(CHUNKED_MARKER))
}

/// Hex size as `strtol(.., 16)` reads it: optional whitespace, optional `+`,
/// optional `0x`, then hex digits; anything after them (chunk extensions)
/// is ignored. `None` when there are no digits or the value is negative.
fn parse_chunk_size(line: &[u8]) -> Option<usize> {
    let mut rest = line.trim_ascii_start();
    match rest.first() {
        Some(b'-') => return None,
        Some(b'+') => rest = &rest[1..],
        _ => {}
    }
    if rest.len() > 2 && rest[0] == b'0' && (rest[1] | 0x20) == b'x' && rest[2].is_ascii_hexdigit() {
        rest = &rest[2..];
    }

    let digits = rest.iter().take_while(|b| b.is_ascii_hexdigit()).count();
    if digits == 0 {
        return None;
    }
    rest[..digits].iter().try_fold(0usize, |acc, &b| {
        let digit = (b as char).to_digit(16)? as usize;
        acc.checked_mul(16)?.checked_add(digit)
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
