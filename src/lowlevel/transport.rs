//! Owns at most one TCP socket to a Rocket/crocket server: connect,
//! send/receive helpers, and a readiness check that never blocks longer
//! than asked.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// Default endpoint, matching the reference implementation.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:1338";
/// Default port used when `CROCKET_SERVER` names a host without a port.
pub const DEFAULT_PORT: u16 = 1338;
/// Environment variable overriding the server endpoint.
pub const SERVER_ENV_VAR: &str = "CROCKET_SERVER";

/// Connect, send, and receive timeout used before the handshake completes.
/// Named so a future non-blocking connect can replace it without touching
/// callers (see the open question on per-frame reconnect stalls).
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(20);

/// Shortest timeout `poll_readable` will actually wait; `Duration::ZERO`
/// cannot be used as a socket timeout, so zero-timeout polls (the per-frame
/// drain) are rounded up to this.
const MIN_POLL_TIMEOUT: Duration = Duration::from_micros(1);

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not resolve Rocket server address")]
    Resolve(#[source] io::Error),
    #[error("failed to connect to the Rocket server")]
    Connect(#[source] io::Error),
    #[error("failed to configure the Rocket connection's socket timeout")]
    Timeout(#[source] io::Error),
    #[error("the Rocket server disconnected")]
    Io(#[source] io::Error),
}

/// Result of a non-blocking readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Empty,
}

/// Parse the `CROCKET_SERVER` environment variable (`host[:port]`) if set,
/// otherwise [`DEFAULT_ENDPOINT`]. Returns `None` if the host cannot be
/// resolved to any address, which forces `PLAYER` mode at init.
pub fn resolve_endpoint() -> Option<SocketAddr> {
    let spec = std::env::var(SERVER_ENV_VAR).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    resolve(&spec)
}

fn resolve(spec: &str) -> Option<SocketAddr> {
    if let Some(addr) = spec.to_socket_addrs().ok().and_then(|mut it| it.next()) {
        return Some(addr);
    }
    // `spec` may be a bare host with no port.
    format!("{spec}:{DEFAULT_PORT}")
        .to_socket_addrs()
        .ok()
        .and_then(|mut it| it.next())
}

/// A single owned TCP connection to the server.
///
/// Before the handshake completes, I/O is bounded by [`CONNECT_TIMEOUT`].
/// After [`Transport::handshake_complete`] is called, timeouts are cleared
/// so reads and writes block normally — safe because every read is
/// preceded by a [`Transport::poll_readable`] call.
#[derive(Debug)]
pub struct Transport {
    stream: TcpStream,
    base_timeout: Option<Duration>,
}

impl Transport {
    /// Connect to `addr` with [`CONNECT_TIMEOUT`] applied to the connect
    /// itself and to subsequent I/O until [`handshake_complete`] is called.
    ///
    /// [`handshake_complete`]: Transport::handshake_complete
    pub fn connect(addr: SocketAddr) -> Result<Self, Error> {
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(Error::Connect)?;
        stream
            .set_read_timeout(Some(CONNECT_TIMEOUT))
            .map_err(Error::Timeout)?;
        stream
            .set_write_timeout(Some(CONNECT_TIMEOUT))
            .map_err(Error::Timeout)?;
        Ok(Self {
            stream,
            base_timeout: Some(CONNECT_TIMEOUT),
        })
    }

    /// Clear the connect-phase timeouts; later reads/writes block normally.
    pub fn handshake_complete(&mut self) -> Result<(), Error> {
        self.base_timeout = None;
        self.stream
            .set_read_timeout(None)
            .map_err(Error::Timeout)?;
        self.stream
            .set_write_timeout(None)
            .map_err(Error::Timeout)
    }

    /// Write `buf` in full. Any partial failure is treated as a
    /// disconnect; the caller must not reuse this transport afterwards.
    pub fn send_all(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.stream.write_all(buf).map_err(Error::Io)
    }

    /// Read exactly `buf.len()` bytes. Any partial failure is treated as a
    /// disconnect.
    pub fn recv_all(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.stream.read_exact(buf).map_err(Error::Io)
    }

    /// Check whether at least one byte is available to read, without
    /// consuming it, waiting up to `timeout`.
    ///
    /// `Duration::ZERO` is rounded up to a minimal non-zero wait since a
    /// zero socket timeout is rejected by the platform; this keeps the
    /// per-frame drain effectively non-blocking.
    pub fn poll_readable(&mut self, timeout: Duration) -> Result<Readiness, Error> {
        let wait = timeout.max(MIN_POLL_TIMEOUT);
        self.stream
            .set_read_timeout(Some(wait))
            .map_err(Error::Timeout)?;
        let mut probe = [0u8; 1];
        let result = self.stream.peek(&mut probe);
        self.stream
            .set_read_timeout(self.base_timeout)
            .map_err(Error::Timeout)?;

        match result {
            Ok(0) => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Rocket server closed the connection",
            ))),
            Ok(_) => Ok(Readiness::Ready),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Readiness::Empty)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Close the connection. A named operation for callers that want to make
    /// the shutdown explicit rather than relying on drop order; equivalent
    /// to dropping the `Transport`.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_bare_host_without_port() {
        let addr = resolve("127.0.0.1").expect("loopback should resolve");
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn resolve_accepts_host_with_port() {
        let addr = resolve("127.0.0.1:4242").expect("loopback should resolve");
        assert_eq!(addr.port(), 4242);
    }

    #[test]
    fn resolve_rejects_unresolvable_host() {
        assert!(resolve("this.host.does.not.resolve.invalid:1338").is_none());
    }
}
