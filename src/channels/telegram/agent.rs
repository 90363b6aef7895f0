//! Telegram Agent
//!
//! Bot construction, login verification, relay session establishment, and
//! dispatcher wiring.

use super::handler::handle_message;
use crate::brain::GeminiClient;
use crate::error::{CrabvoiceError, Result};
use crate::pipeline::VoiceReplyPipeline;
use crate::relay::MediaRelayClient;
use crate::session::SessionGate;
use crate::speech::SpeechSynthesizer;
use std::sync::Arc;
use teloxide::prelude::*;

/// The bot process: one Telegram dispatcher over the session gate, media
/// relay, brain, and synthesizer.
pub struct VoiceBotAgent {
    bot_token: String,
    gate: Arc<SessionGate>,
    relay: Arc<MediaRelayClient>,
    brain: GeminiClient,
    speech: SpeechSynthesizer,
}

impl VoiceBotAgent {
    pub fn new(
        bot_token: String,
        gate: Arc<SessionGate>,
        relay: Arc<MediaRelayClient>,
        brain: GeminiClient,
        speech: SpeechSynthesizer,
    ) -> Self {
        Self {
            bot_token,
            gate,
            relay,
            brain,
            speech,
        }
    }

    /// Log in, establish the relay session, and dispatch updates until
    /// shutdown. Either login failing is fatal — the process does not
    /// proceed to handling messages.
    pub async fn run(self) -> Result<()> {
        let bot = Bot::new(self.bot_token.clone());

        let me = bot
            .get_me()
            .await
            .map_err(|e| CrabvoiceError::Login(format!("Telegram login failed (get_me): {}", e)))?;
        if let Some(ref username) = me.username {
            tracing::info!("Telegram: logged in as @{}", username);
        }

        self.relay.login().await?;

        let pipeline = Arc::new(VoiceReplyPipeline::new(
            bot.clone(),
            self.bot_token,
            self.gate.clone(),
            self.relay.clone(),
            self.brain,
            self.speech,
        ));

        let gate = self.gate;
        let relay = self.relay;

        let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let gate = gate.clone();
            let relay = relay.clone();
            let pipeline = pipeline.clone();
            async move { handle_message(bot, msg, gate, relay, pipeline).await }
        });

        tracing::info!("Telegram: bot is online — use '/Vc on' in your group");

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
