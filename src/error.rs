//! Error taxonomy for catalog and store operations
//!
//! Handlers report failures through these variants; the event loop in
//! `bot.rs` is the final catch-all boundary and turns anything unhandled
//! into a generic apology message.

use thiserror::Error;

/// Errors produced by the content catalog, user store, and feedback sink.
#[derive(Debug, Error)]
pub enum BotError {
    /// A referenced topic, subtopic, or lesson does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or unrecognized input (e.g. an unknown action token).
    #[error("invalid input: {0}")]
    Validation(String),

    /// A storage read or write failed. The enclosing operation's effect
    /// is left undone.
    #[error("persistence failure: {0}")]
    Persistence(#[from] std::io::Error),

    /// A persisted document could not be parsed or serialized.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
