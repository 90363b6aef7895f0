//! Gemini Inference Client
//!
//! Sends a recorded voice note to Google Gemini `generateContent` with an
//! inline base64 audio part and a fixed persona instruction, and returns
//! the composed reply text. Audio understanding and reply generation happen
//! in a single call; there is no separate transcription step.

use crate::error::{CrabvoiceError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed reply persona. The bot answers casually in Hinglish (Hindi-English
/// mix), one or two short sentences, so the synthesized voice sounds like a
/// friend in the call rather than an assistant reading a page.
const REPLY_INSTRUCTION: &str = "You are a playful companion hanging out in a group voice chat. \
Listen to this voice note and reply to the speaker in casual Hinglish (a natural Hindi-English mix, \
written in Latin script). Keep it to one or two short sentences, light and funny. \
Reply with the sentences only, no preamble.";

/// Client for Gemini audio-in / text-out inference.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client,
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Override the model (config `gemini.model`).
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Override the API base URL (for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Listen to a voice note and compose the reply text.
    pub async fn reply_to_voice(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: REPLY_INSTRUCTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(audio),
                        },
                    },
                ],
            }],
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CrabvoiceError::Inference(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrabvoiceError::Inference(format!(
                "Gemini error ({}): {}",
                status, error_text
            )));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CrabvoiceError::Inference(format!("failed to parse response: {}", e)))?;

        let reply = result
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(CrabvoiceError::Inference(
                "Gemini returned no reply text".to_string(),
            ));
        }

        tracing::info!("Gemini: composed reply ({} chars)", reply.len());
        Ok(reply)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
