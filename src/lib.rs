//! Mentor Bot - Telegram learning assistant library
//!
//! A menu-driven chat assistant that:
//! - tracks a per-user progress level
//! - serves a catalog of reference materials and quiz lessons gated by level
//! - collects free-text feedback into an append-only log
//! - promotes a user's level when someone signs up via their referral link
//!
//! State lives in two flat JSON documents (users, catalog) read at startup;
//! the user document is rewritten after every mutation. Handlers talk to
//! Telegram only through the [`telegram::ChatTransport`] trait, so the core
//! logic is testable without the network.
//!
//! # Example
//!
//! ```ignore
//! use mentor_bot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     mentor_bot::bot::run(Config::load()?).await
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod error;
pub mod catalog;
pub mod store;
pub mod token;
pub mod menu;
pub mod progress;
pub mod feedback;
pub mod config;

// Transport and routing
pub mod telegram;
pub mod router;
pub mod bot;
pub mod cli;

// Re-export commonly used types for convenience
pub use catalog::{ContentCatalog, Lesson, TopicEntry};
pub use config::Config;
pub use error::BotError;
pub use feedback::FeedbackSink;
pub use menu::InlineKeyboard;
pub use router::{BotContext, Event, Router};
pub use store::{UserRecord, UserStore, MAX_REFERRAL_LEVEL};
pub use telegram::{ChatTransport, TelegramClient, TelegramConfig};
pub use token::Action;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Telegram learning assistant", NAME, VERSION)
}
