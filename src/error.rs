//! Error Types
//!
//! Closed error-kind enumeration for the bot. Every external collaborator
//! failure maps to exactly one kind so handlers can decide per-kind whether
//! to abort the pipeline, degrade, or report inline.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CrabvoiceError>;

/// All failure kinds the bot can surface.
///
/// Mapping to behavior:
/// - `Login` — fatal at startup, the process does not proceed
/// - `Relay` — reported inline to the requesting chat, state change skipped
/// - `Download` / `Inference` — abort the pipeline for that message,
///   reported inline via the status message
/// - `Synthesis` — logged only, pipeline degrades to text without playback
#[derive(Debug, Error)]
pub enum CrabvoiceError {
    #[error("login failed: {0}")]
    Login(String),

    #[error("media relay error: {0}")]
    Relay(String),

    #[error("voice download failed: {0}")]
    Download(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

impl CrabvoiceError {
    /// Short stable name of the error kind, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Relay(_) => "relay",
            Self::Download(_) => "download",
            Self::Inference(_) => "inference",
            Self::Synthesis(_) => "synthesis",
        }
    }
}
