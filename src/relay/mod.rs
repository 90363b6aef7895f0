//! Media Relay Client
//!
//! HTTP client for the external tgcalls bridge daemon that owns the MTProto
//! user session and bridges audio into live group calls. The bot only
//! speaks the bridge's REST surface: establish the session once at startup,
//! then join/leave calls and play audio files into them.

use crate::error::{CrabvoiceError, Result};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use teloxide::types::ChatId;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the voice-call bridge daemon.
pub struct MediaRelayClient {
    client: Client,
    base_url: String,
    api_id: i64,
    api_hash: String,
    session_string: String,
    keepalive_stream: String,
}

impl MediaRelayClient {
    pub fn new(
        base_url: String,
        keepalive_stream: String,
        api_id: i64,
        api_hash: String,
        session_string: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_id,
            api_hash,
            session_string,
            keepalive_stream,
        }
    }

    /// Establish the bridge's user session from the persisted session
    /// string. Called once at startup; failure is fatal.
    pub async fn login(&self) -> Result<()> {
        let body = json!({
            "api_id": self.api_id,
            "api_hash": self.api_hash,
            "session_string": self.session_string,
        });

        let response = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CrabvoiceError::Login(format!("relay bridge unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrabvoiceError::Login(format!(
                "relay session rejected ({}): {}",
                status, error_text
            )));
        }

        tracing::info!("Relay: session established at {}", self.base_url);
        Ok(())
    }

    /// Join the group call of `chat_id`, playing the configured keep-alive
    /// stream so the connection stays up between replies.
    pub async fn join(&self, chat_id: ChatId) -> Result<()> {
        let body = json!({
            "chat_id": chat_id.0,
            "stream_url": self.keepalive_stream,
        });
        self.post_call("join", chat_id, body).await?;
        tracing::info!("Relay: joined call in chat {}", chat_id);
        Ok(())
    }

    /// Leave the group call of `chat_id`.
    pub async fn leave(&self, chat_id: ChatId) -> Result<()> {
        let body = json!({ "chat_id": chat_id.0 });
        self.post_call("leave", chat_id, body).await?;
        tracing::info!("Relay: left call in chat {}", chat_id);
        Ok(())
    }

    /// Play a local audio file into the joined call of `chat_id`.
    pub async fn play(&self, chat_id: ChatId, source: &Path) -> Result<()> {
        let body = json!({
            "chat_id": chat_id.0,
            "source": source.to_string_lossy(),
        });
        self.post_call("play", chat_id, body).await?;
        tracing::info!("Relay: playing {} in chat {}", source.display(), chat_id);
        Ok(())
    }

    async fn post_call(&self, operation: &str, chat_id: ChatId, body: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/calls/{}", self.base_url, operation))
            .json(&body)
            .send()
            .await
            .map_err(|e| CrabvoiceError::Relay(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CrabvoiceError::Relay(format!(
                "{} for chat {} failed ({}): {}",
                operation, chat_id, status, error_text
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_client(base_url: String) -> MediaRelayClient {
        MediaRelayClient::new(
            base_url,
            "http://example.com/silence.mp3".to_string(),
            12345,
            "test-api-hash".to_string(),
            "test-session".to_string(),
        )
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/session")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"api_id":12345,"api_hash":"test-api-hash","session_string":"test-session"}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"status": "ok"}"#)
            .create_async()
            .await;

        let relay = test_client(server.url());
        let result = relay.login().await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_rejected_is_login_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/session")
            .with_status(401)
            .with_body(r#"{"error": "bad session string"}"#)
            .create_async()
            .await;

        let relay = test_client(server.url());
        let result = relay.login().await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "login");
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_join_sends_keepalive_stream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calls/join")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"chat_id":555,"stream_url":"http://example.com/silence.mp3"}"#.to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let relay = test_client(server.url());
        let result = relay.join(ChatId(555)).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_join_failure_is_relay_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calls/join")
            .with_status(500)
            .with_body("no active voice chat")
            .create_async()
            .await;

        let relay = test_client(server.url());
        let result = relay.join(ChatId(555)).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "relay");
        assert!(err.to_string().contains("no active voice chat"));
    }

    #[tokio::test]
    async fn test_leave_posts_chat_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calls/leave")
            .match_body(mockito::Matcher::PartialJsonString(r#"{"chat_id":555}"#.to_string()))
            .with_status(200)
            .create_async()
            .await;

        let relay = test_client(server.url());
        assert!(relay.leave(ChatId(555)).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_play_posts_file_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calls/play")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"chat_id":555,"source":"/tmp/vc_reply_test.mp3"}"#.to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let relay = test_client(server.url());
        let path = PathBuf::from("/tmp/vc_reply_test.mp3");
        assert!(relay.play(ChatId(555), &path).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_trimmed() {
        let relay = test_client("http://127.0.0.1:8090/".to_string());
        assert_eq!(relay.base_url, "http://127.0.0.1:8090");
    }
}
