//! Voice-Reply Pipeline
//!
//! The linear per-message pipeline: download the voice note, compose a
//! reply with the brain, synthesize speech, play it into the engaged call,
//! clean up. Download and inference failures abort the run and are reported
//! on the status message; synthesis and playback failures only degrade the
//! run to a text reply.

use crate::brain::GeminiClient;
use crate::error::{CrabvoiceError, Result};
use crate::relay::MediaRelayClient;
use crate::session::SessionGate;
use crate::speech::SpeechSynthesizer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::Voice;
use uuid::Uuid;

const LISTENING_STATUS: &str = "👂 Listening...";

/// How long the synthesized reply file stays on disk after playback starts.
/// The relay streams from the path, so removal is deferred rather than
/// immediate.
const REPLY_CLEANUP_DELAY: Duration = Duration::from_secs(60);

/// Per-message orchestration of the four external collaborators.
pub struct VoiceReplyPipeline {
    bot: Bot,
    bot_token: String,
    gate: Arc<SessionGate>,
    relay: Arc<MediaRelayClient>,
    brain: GeminiClient,
    speech: SpeechSynthesizer,
}

impl VoiceReplyPipeline {
    pub fn new(
        bot: Bot,
        bot_token: String,
        gate: Arc<SessionGate>,
        relay: Arc<MediaRelayClient>,
        brain: GeminiClient,
        speech: SpeechSynthesizer,
    ) -> Self {
        Self {
            bot,
            bot_token,
            gate,
            relay,
            brain,
            speech,
        }
    }

    /// Run the pipeline for one incoming message. Messages outside the
    /// engaged chat, non-voice messages, and messages arriving while a
    /// previous run is in flight are ignored silently.
    pub async fn handle_message(&self, msg: &Message) -> ResponseResult<()> {
        let Some(voice) = msg.voice() else {
            return Ok(());
        };

        if !self.gate.is_engaged(msg.chat.id).await {
            tracing::debug!("Pipeline: ignoring voice message in non-engaged chat {}", msg.chat.id);
            return Ok(());
        }

        let Some(_ticket) = self.gate.try_begin_run() else {
            tracing::debug!(
                "Pipeline: a run is already in flight, skipping voice message in chat {}",
                msg.chat.id
            );
            return Ok(());
        };

        tracing::info!("Pipeline: voice note in chat {} — {}s", msg.chat.id, voice.duration);

        let status = self.bot.send_message(msg.chat.id, LISTENING_STATUS).await?;

        let audio_path = match self.download_voice(voice).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(kind = e.kind(), "Pipeline: {}", e);
                self.bot
                    .edit_message_text(msg.chat.id, status.id, format!("❌ Error: {}", e))
                    .await?;
                return Ok(());
            }
        };

        let mime_type = voice
            .mime_type
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "audio/ogg".to_string());

        let reply_text = match self.compose_reply(&audio_path, &mime_type).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(kind = e.kind(), "Pipeline: {}", e);
                self.bot
                    .edit_message_text(msg.chat.id, status.id, format!("❌ Error: {}", e))
                    .await?;
                remove_file_logged(&audio_path).await;
                return Ok(());
            }
        };

        self.bot
            .edit_message_text(msg.chat.id, status.id, format!("🗣 {}", reply_text))
            .await?;

        // Synthesis and playback degrade instead of aborting: the composed
        // reply already stands in the chat.
        match self.speech.synthesize(&reply_text).await {
            Ok(audio) => match write_reply_audio(&audio).await {
                Ok(mp3_path) => {
                    if let Err(e) = self.relay.play(msg.chat.id, &mp3_path).await {
                        tracing::error!(kind = e.kind(), "Pipeline: playback failed: {}", e);
                    }
                    schedule_cleanup(mp3_path, REPLY_CLEANUP_DELAY);
                }
                Err(e) => {
                    tracing::error!(kind = e.kind(), "Pipeline: {}", e);
                }
            },
            Err(e) => {
                tracing::error!(kind = e.kind(), "Pipeline: continuing without playback: {}", e);
            }
        }

        remove_file_logged(&audio_path).await;
        Ok(())
    }

    /// Fetch the voice note payload from Telegram into a temp file.
    async fn download_voice(&self, voice: &Voice) -> Result<PathBuf> {
        let file = self
            .bot
            .get_file(&voice.file.id)
            .await
            .map_err(|e| CrabvoiceError::Download(format!("get_file failed: {}", e)))?;

        let download_url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file.path
        );

        let response = reqwest::get(&download_url)
            .await
            .map_err(|e| CrabvoiceError::Download(format!("fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrabvoiceError::Download(format!(
                "fetch failed with status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CrabvoiceError::Download(format!("read failed: {}", e)))?;

        let path = voice_note_path();
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| CrabvoiceError::Download(format!("write {} failed: {}", path.display(), e)))?;

        tracing::info!("Pipeline: downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Read the downloaded audio and ask the brain for a reply.
    async fn compose_reply(&self, audio_path: &Path, mime_type: &str) -> Result<String> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| CrabvoiceError::Download(format!("read {} failed: {}", audio_path.display(), e)))?;

        self.brain.reply_to_voice(&audio, mime_type).await
    }
}

/// Temp location for a downloaded voice note.
fn voice_note_path() -> PathBuf {
    std::env::temp_dir().join(format!("vc_note_{}.ogg", Uuid::new_v4()))
}

/// Temp location for a synthesized reply.
fn reply_audio_path() -> PathBuf {
    std::env::temp_dir().join(format!("vc_reply_{}.mp3", Uuid::new_v4()))
}

/// Write synthesized audio to its temp location.
async fn write_reply_audio(audio: &[u8]) -> Result<PathBuf> {
    let path = reply_audio_path();
    tokio::fs::write(&path, audio)
        .await
        .map_err(|e| CrabvoiceError::Synthesis(format!("write {} failed: {}", path.display(), e)))?;
    Ok(path)
}

async fn remove_file_logged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Pipeline: failed to remove {}: {}", path.display(), e);
    }
}

/// Remove a file after `delay` without blocking the pipeline.
fn schedule_cleanup(path: PathBuf, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tokio::fs::remove_file(path).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_note_path_shape() {
        let path = voice_note_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("vc_note_"));
        assert!(name.ends_with(".ogg"));
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_reply_audio_path_shape() {
        let path = reply_audio_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("vc_reply_"));
        assert!(name.ends_with(".mp3"));
    }

    #[test]
    fn test_temp_paths_are_unique() {
        assert_ne!(voice_note_path(), voice_note_path());
        assert_ne!(reply_audio_path(), reply_audio_path());
    }

    #[tokio::test]
    async fn test_write_reply_audio_roundtrip() {
        let path = write_reply_audio(b"fake-mp3").await.unwrap();
        let on_disk = tokio::fs::read(&path).await.unwrap();
        assert_eq!(on_disk, b"fake-mp3");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_file_logged_deletes() {
        let path = voice_note_path();
        tokio::fs::write(&path, b"x").await.unwrap();
        remove_file_logged(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_file_logged_missing_file_is_quiet() {
        // Must not panic or error outward on an already-removed file.
        remove_file_logged(Path::new("/nonexistent/vc_note_gone.ogg")).await;
    }

    #[tokio::test]
    async fn test_schedule_cleanup_removes_after_delay() {
        let path = reply_audio_path();
        tokio::fs::write(&path, b"x").await.unwrap();
        schedule_cleanup(path.clone(), Duration::from_millis(10));
        assert!(path.exists());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!path.exists());
    }
}
