//! Error types for minilead

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    // === Network Errors ===
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Telemetry session closed: {0}")]
    SessionClosed(String),

    #[error("Discovery timed out")]
    DiscoveryTimeout,

    // === Protocol Errors ===
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Encode error: {0}")]
    Encode(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// Retryable errors are recovered locally (reconnect on the follower,
    /// eviction on the leader) and never terminate the process. Bind and
    /// configuration errors are not retryable within the same role start.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::ConnectionFailed(_)
                | Error::SessionClosed(_)
                | Error::DiscoveryTimeout
        )
    }

    /// Is this a per-message error that leaves the session usable?
    pub fn is_recoverable_payload(&self) -> bool {
        matches!(self, Error::MalformedPayload(_))
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::DiscoveryTimeout.is_retryable());
        assert!(Error::ConnectionFailed("refused".into()).is_retryable());
        assert!(Error::SessionClosed("reset".into()).is_retryable());

        assert!(!Error::InvalidConfig("bad port".into()).is_retryable());
        let bind = Error::Bind {
            addr: "0.0.0.0:9876".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(!bind.is_retryable());
    }

    #[test]
    fn test_payload_errors_do_not_kill_session() {
        assert!(Error::MalformedPayload("bad entry".into()).is_recoverable_payload());
        assert!(!Error::SessionClosed("eof".into()).is_recoverable_payload());
    }
}
