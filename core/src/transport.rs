//! One blocking connection, optionally wrapped in TLS.
//!
//! # Design
//! A `Channel` is opened per request and never reused. The host name is
//! resolved and only the first address is tried. Read and write timeouts are
//! set on the socket itself, so a stalled peer surfaces as a read error that
//! the response reader treats like end of stream.
//!
//! For HTTPS the TLS handshake completes inside `open`, before the caller can
//! write a byte. Teardown lives in `Drop`: every exit path, including early
//! returns on error, sends close-notify (TLS) and shuts the socket down.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::tls;
use crate::url::ParsedUrl;

enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

/// An open connection to the host named by a `ParsedUrl`.
pub struct Channel {
    stream: Stream,
    peer: SocketAddr,
}

impl Channel {
    pub fn open(url: &ParsedUrl, config: &ClientConfig) -> Result<Self> {
        let peer = resolve_first(&url.host, url.port)?;
        let timeout = config.timeout();

        debug!(host = %url.host, %peer, "connecting");
        let tcp = TcpStream::connect_timeout(&peer, timeout)
            .map_err(|e| Error::transport(&format!("connect to {peer}"), e))?;
        tcp.set_read_timeout(Some(timeout))
            .map_err(|e| Error::transport("set read timeout", e))?;
        tcp.set_write_timeout(Some(timeout))
            .map_err(|e| Error::transport("set write timeout", e))?;

        let stream = if url.scheme.is_tls() {
            let tls_config = tls::client_config(config.verify_certificates)?;
            Stream::Tls(Box::new(handshake(tcp, &url.host, tls_config)?))
        } else {
            Stream::Plain(tcp)
        };

        Ok(Self { stream, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.stream, Stream::Tls(_))
    }

    /// Write every byte or fail; a short write is a transport error.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)
            .and_then(|()| self.flush())
            .map_err(|e| Error::transport("send request", e))?;
        trace!(bytes = bytes.len(), "request sent");
        Ok(())
    }
}

impl Read for Channel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stream {
            Stream::Plain(tcp) => tcp.read(buf),
            Stream::Tls(tls) => tls.read(buf),
        }
    }
}

impl Write for Channel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.stream {
            Stream::Plain(tcp) => tcp.write(buf),
            Stream::Tls(tls) => tls.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.stream {
            Stream::Plain(tcp) => tcp.flush(),
            Stream::Tls(tls) => tls.flush(),
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        match &mut self.stream {
            Stream::Plain(tcp) => {
                let _ = tcp.shutdown(Shutdown::Both);
            }
            Stream::Tls(tls) => {
                let tls = &mut **tls;
                tls.conn.send_close_notify();
                while tls.conn.wants_write() {
                    match tls.conn.write_tls(&mut tls.sock) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = tls.sock.shutdown(Shutdown::Both);
            }
        }
        trace!(peer = %self.peer, "channel closed");
    }
}

fn resolve_first(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::transport(&format!("resolve {host}"), e))?
        .next()
        .ok_or_else(|| Error::Transport(format!("resolve {host}: no addresses")))
}

fn handshake(
    mut tcp: TcpStream,
    host: &str,
    config: Arc<rustls::ClientConfig>,
) -> Result<StreamOwned<ClientConnection, TcpStream>> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::transport(&format!("invalid TLS server name {host}"), e))?;
    let mut conn = ClientConnection::new(config, server_name)
        .map_err(|e| Error::transport("create TLS session", e))?;

    while conn.is_handshaking() {
        conn.complete_io(&mut tcp)
            .map_err(|e| Error::transport("TLS handshake", e))?;
    }
    debug!(
        host,
        version = ?conn.protocol_version(),
        "TLS handshake complete"
    );
    Ok(StreamOwned::new(conn, tcp))
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::url::ParsedUrl;

    #[test]
    fn unresolvable_host_is_transport_error() {
        let url = ParsedUrl::parse("http://host.invalid/").unwrap();
        let err = Channel::open(&url, &ClientConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let url = ParsedUrl::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let err = Channel::open(&url, &ClientConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn tls_handshake_against_plain_server_fails() {
        let _guard = tls::TEST_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf);
            let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n");
        });

        let url = ParsedUrl::parse(&format!("https://127.0.0.1:{}/", addr.port())).unwrap();
        let err = Channel::open(&url, &ClientConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Transport(_)));
        server.join().unwrap();
    }

    #[test]
    fn plain_channel_sends_and_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).unwrap();
            received
        });

        let url = ParsedUrl::parse(&format!("http://127.0.0.1:{}/", addr.port())).unwrap();
        let mut channel = Channel::open(&url, &ClientConfig::default()).unwrap();
        assert!(!channel.is_tls());
        assert_eq!(channel.peer_addr(), addr);
        channel.send(b"ping").unwrap();
        drop(channel);

        assert_eq!(server.join().unwrap(), b"ping");
    }
}
