use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("backend response does not match schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("backend response too large ({0} bytes)")]
    BodyTooLarge(usize),
}

impl BackendError {
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http(err)
        }
    }

    /// Status code the backend answered with, when it answered at all.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
