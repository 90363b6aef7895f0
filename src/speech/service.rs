//! Speech Synthesis Service
//!
//! Text-to-speech through an edge-tts gateway speaking the OpenAI speech
//! API shape. The gateway needs no API key; the voice profile is fixed per
//! deployment (default `hi-IN-SwaraNeural`, which handles Hinglish well).

use crate::error::{CrabvoiceError, Result};
use reqwest::Client;
use std::time::Duration;

const SPEECH_PATH: &str = "/v1/audio/speech";
const DEFAULT_VOICE: &str = "hi-IN-SwaraNeural";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the TTS gateway.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    client: Client,
    base_url: String,
    voice: String,
}

impl SpeechSynthesizer {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice: DEFAULT_VOICE.to_string(),
        }
    }

    /// Override the voice profile (config `speech.voice`).
    pub fn with_voice(mut self, voice: String) -> Self {
        self.voice = voice;
        self
    }

    /// Synthesize `text` into MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "model": "tts-1",
            "input": text,
            "voice": self.voice,
            "response_format": "mp3",
        });

        let response = self
            .client
            .post(format!("{}{}", self.base_url, SPEECH_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| CrabvoiceError::Synthesis(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrabvoiceError::Synthesis(format!(
                "TTS gateway error ({}): {}",
                status, error_text
            )));
        }

        let audio_bytes = response
            .bytes()
            .await
            .map_err(|e| CrabvoiceError::Synthesis(format!("failed to read audio bytes: {}", e)))?
            .to_vec();

        tracing::info!(
            "TTS: generated {} bytes of audio (voice={})",
            audio_bytes.len(),
            self.voice,
        );

        Ok(audio_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthesize_success() {
        let fake_audio = vec![0xFFu8; 256];
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/speech")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(fake_audio.clone())
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url());
        let result = synth.synthesize("Arre yaar, kya baat hai!").await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), fake_audio);
    }

    #[tokio::test]
    async fn test_synthesize_sends_default_voice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/speech")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"voice":"hi-IN-SwaraNeural","response_format":"mp3"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(vec![0u8; 10])
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url());
        let _ = synth.synthesize("Test input").await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_synthesize_custom_voice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/speech")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"voice":"en-US-AriaNeural"}"#.to_string(),
            ))
            .with_status(200)
            .with_body(vec![1u8; 10])
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url()).with_voice("en-US-AriaNeural".to_string());
        let result = synth.synthesize("Test").await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_synthesize_gateway_error_is_synthesis_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/speech")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url());
        let result = synth.synthesize("Hello").await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "synthesis");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_synthesize_empty_audio_passthrough() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/audio/speech")
            .with_status(200)
            .with_body(Vec::<u8>::new())
            .create_async()
            .await;

        let synth = SpeechSynthesizer::new(server.url());
        let result = synth.synthesize("Hello").await;
        assert!(result.unwrap().is_empty());
    }
}
