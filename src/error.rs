//! Error types for the tracker connection
//!
//! None of these reach the UI layer: the connection loop logs them and
//! falls back to the close-and-retry path. They are returned from the
//! frame and config functions so callers and tests can see what happened.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Inbound frame is not a valid tracker message.
    ///
    /// Covers invalid JSON, a missing or non-string `type` field, and a
    /// `Payload` whose `stats` does not match the snapshot type.
    #[error("Malformed tracker message: {0}")]
    Parse(#[from] serde_json::Error),

    /// Socket-level failure (connect refused, handshake, read error).
    #[error("WebSocket transport error: {0}")]
    Transport(String),

    /// Page URL or endpoint could not be understood.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The connection task is gone.
    #[error("Tracker connection task has stopped")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
