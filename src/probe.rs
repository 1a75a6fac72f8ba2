use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::preferences::Preferences;

/// Hard upper bound on the TCP handshake.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("{target} resolved to no addresses")]
    NoAddress { target: String },
    #[error("{addr}: no answer within {timeout:?}")]
    Timeout { addr: SocketAddr, timeout: Duration },
    #[error("{addr}: connection refused")]
    Refused { addr: SocketAddr },
    #[error("{addr}: {source}")]
    Unreachable {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Latency check by timing a TCP connect, no ICMP privileges needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    target: String,
    port: u16,
    timeout: Duration,
}

impl Probe {
    pub fn new(target: impl Into<String>, port: u16) -> Self {
        Self {
            target: target.into(),
            port,
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(prefs.ping_target.clone(), prefs.ping_port)
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Round-trip time of one connect. The connection is closed right away.
    pub fn measure(&self) -> Result<Duration, ProbeError> {
        let addr = self.resolve()?;
        let started = Instant::now();
        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| self.classify(addr, e))?;
        let elapsed = started.elapsed();
        drop(stream);
        Ok(elapsed)
    }

    fn resolve(&self) -> Result<SocketAddr, ProbeError> {
        (self.target.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| ProbeError::Resolve {
                target: self.target.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| ProbeError::NoAddress {
                target: self.target.clone(),
            })
    }

    fn classify(&self, addr: SocketAddr, err: io::Error) -> ProbeError {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeError::Timeout {
                addr,
                timeout: self.timeout,
            },
            io::ErrorKind::ConnectionRefused => ProbeError::Refused { addr },
            _ => ProbeError::Unreachable { addr, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_probe_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let latency = Probe::new("127.0.0.1", port).measure().unwrap();
        assert!(latency < PROBE_TIMEOUT);
    }

    #[test]
    fn test_probe_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = Probe::new("127.0.0.1", port).measure().unwrap_err();
        assert!(matches!(err, ProbeError::Refused { .. }), "{err}");
    }

    #[test]
    fn test_probe_unroutable_is_bounded() {
        // TEST-NET-1, never routed
        let timeout = Duration::from_millis(200);
        let started = Instant::now();
        let result = Probe::new("192.0.2.1", 9).with_timeout(timeout).measure();
        assert!(result.is_err());
        assert!(started.elapsed() < timeout + Duration::from_secs(1));
    }

    #[test]
    fn test_error_kinds_are_classified() {
        let probe = Probe::new("192.0.2.1", 9);
        let addr: SocketAddr = "192.0.2.1:9".parse().unwrap();
        let timed_out = probe.classify(addr, io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(
            timed_out,
            ProbeError::Timeout { timeout, .. } if timeout == PROBE_TIMEOUT
        ));
        let refused = probe.classify(addr, io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(matches!(refused, ProbeError::Refused { .. }));
        let other = probe.classify(addr, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(other, ProbeError::Unreachable { .. }));
    }

    #[test]
    fn test_probe_bad_host() {
        let err = Probe::new("no such host.invalid", 53).measure().unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Resolve { .. } | ProbeError::NoAddress { .. }
        ));
    }

    #[test]
    fn test_probe_from_preferences() {
        let prefs = Preferences::default();
        let probe = Probe::from_preferences(&prefs);
        assert_eq!(probe, Probe::new("8.8.8.8", 53));
    }
}
