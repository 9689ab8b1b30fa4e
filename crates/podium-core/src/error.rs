//! Shared error type across Podium crates.

use thiserror::Error;

/// Application close codes carried on the WebSocket close frame (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// Init referenced a presentation the store does not know.
    PresentationNotFound,
    /// Presenter-role init with a mismatched client id.
    Unauthorized,
}

impl CloseCode {
    /// Numeric close code (4xxx application range).
    pub fn as_u16(self) -> u16 {
        match self {
            CloseCode::PresentationNotFound => 4404,
            CloseCode::Unauthorized => 4401,
        }
    }

    /// Wire name carried as the close reason.
    pub fn as_str(self) -> &'static str {
        match self {
            CloseCode::PresentationNotFound => "presentation_not_found",
            CloseCode::Unauthorized => "unauthorized",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PodiumError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PodiumError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("presentation not found")]
    PresentationNotFound,
    #[error("unauthorized presenter")]
    Unauthorized,
    #[error("internal: {0}")]
    Internal(String),
}

impl PodiumError {
    /// Close code for the failures that terminate a connection during init.
    /// Everything else stays in-band (dropped frame or silent no-op).
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            PodiumError::PresentationNotFound => Some(CloseCode::PresentationNotFound),
            PodiumError::Unauthorized => Some(CloseCode::Unauthorized),
            _ => None,
        }
    }
}
