//! Telegram Bot Integration
//!
//! Runs the Telegram bot: exact-match voice-chat commands engage and
//! disengage the session gate, and voice notes in the engaged chat are
//! forwarded to the reply pipeline.

mod agent;
pub(crate) mod handler;

pub use agent::VoiceBotAgent;
pub use handler::VcCommand;
