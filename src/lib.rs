//! CrabVoice - Telegram Voice-Chat AI Companion Bot
//!
//! Joins a group voice chat on Telegram, listens to voice notes in the
//! engaged chat, composes a short reply with Gemini, and speaks it back
//! into the call through a tgcalls bridge and an edge-tts gateway.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the bot (default command)
//! crabvoice
//!
//! # Show resolved configuration
//! crabvoice config
//! ```
//!
//! In your group: `/Vc on` joins the voice chat, any voice note gets a
//! spoken reply, `/Vc off` leaves.

pub mod brain;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod relay;
pub mod session;
pub mod speech;

// Re-export commonly used types
pub use error::{CrabvoiceError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
