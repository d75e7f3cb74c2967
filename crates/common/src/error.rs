//! Error types for labpull

use thiserror::Error;

/// Result type alias using labpull Error
pub type Result<T> = std::result::Result<T, Error>;

/// labpull error types
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid image name: {0}")]
    InvalidName(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response status {status}")]
    Protocol { status: u16 },

    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("install job not found: {0}")]
    JobNotFound(String),

    #[error("host unreachable after {attempts} consecutive failed polls")]
    HostUnreachable { attempts: u32 },
}

impl Error {
    /// True for failures a polling loop retries silently: transport
    /// blips, malformed bodies, and unexpected statuses other than 404.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Malformed(_) | Error::Protocol { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Network("refused".into()).is_transient());
        assert!(Error::Malformed("bad json".into()).is_transient());
        assert!(Error::Protocol { status: 502 }.is_transient());
        assert!(!Error::JobNotFound("j1".into()).is_transient());
        assert!(!Error::Rejected("nope".into()).is_transient());
        assert!(!Error::HostUnreachable { attempts: 30 }.is_transient());
    }
}
