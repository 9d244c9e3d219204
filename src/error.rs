//! Error taxonomy for the discovery and fetch stages.

use thiserror::Error;

/// Errors raised while driving a page or fetching an item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Page failed to load or settle: {0}")]
    Navigation(String),

    #[error("No asset URL could be extracted from the detail page")]
    Resolution,

    #[error("Upstream returned an unusable response: {0}")]
    Upstream(String),

    #[error("Downloaded payload too small to be genuine media ({size} bytes)")]
    InvalidPayload { size: u64 },

    #[error("Transport fault: {0}")]
    Transport(String),
}

impl FetchError {
    /// Coarse classification used for outcome aggregation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Navigation(_) => ErrorKind::Navigation,
            FetchError::Resolution => ErrorKind::Resolution,
            FetchError::Upstream(_) => ErrorKind::Upstream,
            FetchError::InvalidPayload { .. } => ErrorKind::InvalidPayload,
            FetchError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Reason attached to a failed download outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Navigation,
    Resolution,
    Upstream,
    InvalidPayload,
    Transport,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Navigation => "navigation",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Upstream => "upstream",
            ErrorKind::InvalidPayload => "invalid-payload",
            ErrorKind::Transport => "transport",
        };
        write!(f, "{}", name)
    }
}
