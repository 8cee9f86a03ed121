//! One-shot blocking HTTP(S) client.
//!
//! # Design
//! `HttpClient` holds only its `ClientConfig`; each call opens a fresh
//! channel, sends one request, drains the response to end of stream and
//! closes the channel before returning. The only outcomes are an error (no
//! response exists) or a `Response` whose status the caller interprets.
//! Redirects are returned as-is.

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{Headers, Method, Request, Response};
use crate::response::read_response;
use crate::transport::Channel;
use crate::url::ParsedUrl;

#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one request/response exchange.
    ///
    /// `body` is sent verbatim with a `Content-Length`; `headers` follow
    /// `Host` in the order given.
    pub fn request(
        &self,
        url: &str,
        method: Method,
        body: Option<&[u8]>,
        headers: &Headers,
    ) -> Result<Response> {
        let target = ParsedUrl::parse(url)?;
        let request = Request {
            method,
            host: target.host.clone(),
            path: target.path.clone(),
            headers: headers.clone(),
            body: body.map(<[u8]>::to_vec),
        };

        let mut channel = Channel::open(&target, &self.config)?;
        channel.send(&request.to_bytes())?;
        let response = read_response(&mut channel, self.config.read_buffer_size)?;
        drop(channel);

        debug!(
            %method,
            url = %target,
            status = response.status,
            body_bytes = response.body.len(),
            "request complete"
        );
        Ok(response)
    }

    pub fn get(&self, url: &str, headers: &Headers) -> Result<Response> {
        self.request(url, Method::Get, None, headers)
    }

    pub fn post(&self, url: &str, body: &[u8], headers: &Headers) -> Result<Response> {
        self.request(url, Method::Post, Some(body), headers)
    }

    pub fn put(&self, url: &str, body: &[u8], headers: &Headers) -> Result<Response> {
        self.request(url, Method::Put, Some(body), headers)
    }

    pub fn delete(&self, url: &str, headers: &Headers) -> Result<Response> {
        self.request(url, Method::Delete, None, headers)
    }
}

/// `HttpClient::request` with the default configuration.
pub fn request(
    url: &str,
    method: Method,
    body: Option<&[u8]>,
    headers: Option<&Headers>,
) -> Result<Response> {
    let empty = Headers::new();
    HttpClient::default().request(url, method, body, headers.unwrap_or(&empty))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::error::Error;

    /// Serve one connection: capture the request head, reply with `reply`,
    /// close.
    fn serve_once(reply: &'static [u8]) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            socket.write_all(reply).unwrap();
            received
        });
        (base, handle)
    }

    #[test]
    fn get_round_trip() {
        let (base, server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n198.51.100.4");
        let mut headers = Headers::new();
        headers.add("Accept", "text/plain");

        let response = HttpClient::default()
            .get(&format!("{base}/ip"), &headers)
            .unwrap();
        assert!(response.succeeded());
        assert_eq!(response.text(), "198.51.100.4");

        let sent = String::from_utf8(server.join().unwrap()).unwrap();
        assert!(sent.starts_with("GET /ip HTTP/1.1\r\nHost: 127.0.0.1\r\nAccept: text/plain\r\n\r\n"));
    }

    #[test]
    fn non_2xx_is_a_response_not_an_error() {
        let (base, server) = serve_once(b"HTTP/1.1 403 Forbidden\r\n\r\n{\"success\":false}");
        let response = request(&format!("{base}/"), Method::Delete, None, None).unwrap();
        assert_eq!(response.status, 403);
        assert!(!response.succeeded());
        assert_eq!(response.text(), "{\"success\":false}");
        server.join().unwrap();
    }

    #[test]
    fn malformed_url_fails_before_connecting() {
        let err = request("gopher://example.com/", Method::Get, None, None).unwrap_err();
        assert!(matches!(err, Error::MalformedUrl(_)));
    }

    #[test]
    fn silent_close_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });
        let err = HttpClient::default().get(&base, &Headers::new()).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        server.join().unwrap();
    }
}
