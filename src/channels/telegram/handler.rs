//! Telegram Message Handler
//!
//! Processes incoming messages: the `/Vc on` / `/Vc off` commands drive the
//! session gate through the media relay, and everything else is handed to
//! the voice-reply pipeline (which ignores anything but voice notes in the
//! engaged chat).

use crate::pipeline::VoiceReplyPipeline;
use crate::relay::MediaRelayClient;
use crate::session::SessionGate;
use std::sync::Arc;
use teloxide::prelude::*;

/// Voice-chat control commands. Matching is exact and case-sensitive:
/// `/Vc on` and `/Vc off`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcCommand {
    On,
    Off,
}

impl VcCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/Vc on" => Some(Self::On),
            "/Vc off" => Some(Self::Off),
            _ => None,
        }
    }
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    gate: Arc<SessionGate>,
    relay: Arc<MediaRelayClient>,
    pipeline: Arc<VoiceReplyPipeline>,
) -> ResponseResult<()> {
    if let Some(text) = msg.text()
        && let Some(command) = VcCommand::parse(text)
    {
        return match command {
            VcCommand::On => handle_join(bot, msg, gate, relay).await,
            VcCommand::Off => handle_leave(bot, msg, gate, relay).await,
        };
    }

    pipeline.handle_message(&msg).await
}

/// `/Vc on` — join the voice chat of this chat and engage the gate.
async fn handle_join(
    bot: Bot,
    msg: Message,
    gate: Arc<SessionGate>,
    relay: Arc<MediaRelayClient>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    tracing::info!("Telegram: /Vc on in chat {}", chat_id);

    bot.send_message(chat_id, "🔄 Joining voice chat...").await?;

    match relay.join(chat_id).await {
        Ok(()) => {
            gate.engage(chat_id).await;
            bot.send_message(
                chat_id,
                "✅ Connected!\nSend me a voice note — I'll listen and talk back in the call.",
            )
            .await?;
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "Telegram: join failed: {}", e);
            bot.send_message(chat_id, format!("❌ Join error: {}", e)).await?;
        }
    }

    Ok(())
}

/// `/Vc off` — leave the voice chat. The gate is cleared only when the
/// relay confirms the leave, so the bot's view cannot drift from the call
/// it is actually joined to.
async fn handle_leave(
    bot: Bot,
    msg: Message,
    gate: Arc<SessionGate>,
    relay: Arc<MediaRelayClient>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    tracing::info!("Telegram: /Vc off in chat {}", chat_id);

    match relay.leave(chat_id).await {
        Ok(()) => {
            gate.disengage(chat_id).await;
            bot.send_message(chat_id, "👋 Left voice chat.").await?;
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "Telegram: leave failed: {}", e);
            bot.send_message(chat_id, format!("❌ Leave error: {}", e)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse_exact_matches() {
        assert_eq!(VcCommand::parse("/Vc on"), Some(VcCommand::On));
        assert_eq!(VcCommand::parse("/Vc off"), Some(VcCommand::Off));
    }

    #[test]
    fn test_command_parse_is_case_sensitive() {
        assert_eq!(VcCommand::parse("/vc on"), None);
        assert_eq!(VcCommand::parse("/VC ON"), None);
        assert_eq!(VcCommand::parse("/Vc On"), None);
    }

    #[test]
    fn test_command_parse_rejects_whitespace_variants() {
        assert_eq!(VcCommand::parse("/Vc  on"), None);
        assert_eq!(VcCommand::parse(" /Vc on"), None);
        assert_eq!(VcCommand::parse("/Vc on "), None);
    }

    #[test]
    fn test_command_parse_rejects_prefixes_and_suffixes() {
        assert_eq!(VcCommand::parse("/Vc"), None);
        assert_eq!(VcCommand::parse("/Vc onx"), None);
        assert_eq!(VcCommand::parse("/Vc on please"), None);
        assert_eq!(VcCommand::parse("hey /Vc on"), None);
        assert_eq!(VcCommand::parse(""), None);
    }
}
