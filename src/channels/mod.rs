//! Channel Integrations
//!
//! Messaging channel integrations. Telegram is the only channel: it carries
//! the voice-chat commands and the voice notes the bot replies to.

pub mod telegram;

pub use telegram::VoiceBotAgent;
