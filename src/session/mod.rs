//! Voice Session Gate
//!
//! Tracks which chat (if any) currently has an active voice session, and
//! hands out the admission token that keeps two reply pipelines from
//! running over each other.
//!
//! The gate is an explicit registry object injected into handlers rather
//! than ambient global state. At most one chat is engaged at any moment:
//! engaging a new chat implicitly disengages the previous one.

use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held for the duration of one voice-reply pipeline run. Dropping it
/// releases the admission token.
pub type RunTicket = OwnedMutexGuard<()>;

/// Single-occupancy registry of the engaged voice chat.
pub struct SessionGate {
    engaged: Mutex<Option<ChatId>>,
    run_token: Arc<Mutex<()>>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            engaged: Mutex::new(None),
            run_token: Arc::new(Mutex::new(())),
        }
    }

    /// Record `chat_id` as the engaged chat. Any previously engaged chat is
    /// implicitly disengaged. Call only after the relay join succeeded.
    pub async fn engage(&self, chat_id: ChatId) {
        let mut engaged = self.engaged.lock().await;
        if let Some(previous) = *engaged
            && previous != chat_id
        {
            tracing::info!("Session gate: chat {} replaces engaged chat {}", chat_id, previous);
        }
        *engaged = Some(chat_id);
    }

    /// Clear the engaged chat. Call only after the relay leave succeeded;
    /// a failed leave keeps the gate engaged so the bot's view cannot drift
    /// from the call it is still joined to.
    pub async fn disengage(&self, chat_id: ChatId) {
        let mut engaged = self.engaged.lock().await;
        if *engaged == Some(chat_id) {
            *engaged = None;
        } else {
            tracing::debug!("Session gate: disengage for {} but engaged chat is {:?}", chat_id, *engaged);
        }
    }

    /// Whether `chat_id` is the currently engaged chat.
    pub async fn is_engaged(&self, chat_id: ChatId) -> bool {
        *self.engaged.lock().await == Some(chat_id)
    }

    /// The currently engaged chat, if any.
    pub async fn current(&self) -> Option<ChatId> {
        *self.engaged.lock().await
    }

    /// Try to claim the pipeline admission token. Returns `None` while a
    /// previous voice-reply run is still in flight, in which case the new
    /// voice message is skipped instead of racing the running pipeline's
    /// temp files and status-message edits.
    pub fn try_begin_run(&self) -> Option<RunTicket> {
        self.run_token.clone().try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gate_starts_disengaged() {
        let gate = SessionGate::new();
        assert_eq!(gate.current().await, None);
        assert!(!gate.is_engaged(ChatId(555)).await);
    }

    #[tokio::test]
    async fn test_engage_then_is_engaged() {
        let gate = SessionGate::new();
        gate.engage(ChatId(555)).await;
        assert!(gate.is_engaged(ChatId(555)).await);
        assert!(!gate.is_engaged(ChatId(777)).await);
        assert_eq!(gate.current().await, Some(ChatId(555)));
    }

    #[tokio::test]
    async fn test_disengage_clears_state() {
        let gate = SessionGate::new();
        gate.engage(ChatId(555)).await;
        gate.disengage(ChatId(555)).await;
        assert!(!gate.is_engaged(ChatId(555)).await);
        assert_eq!(gate.current().await, None);
    }

    #[tokio::test]
    async fn test_disengage_other_chat_is_noop() {
        let gate = SessionGate::new();
        gate.engage(ChatId(555)).await;
        gate.disengage(ChatId(777)).await;
        assert!(gate.is_engaged(ChatId(555)).await);
    }

    #[tokio::test]
    async fn test_reengage_replaces_previous_chat() {
        let gate = SessionGate::new();
        gate.engage(ChatId(555)).await;
        gate.engage(ChatId(777)).await;
        // At most one chat engaged: the new one.
        assert!(gate.is_engaged(ChatId(777)).await);
        assert!(!gate.is_engaged(ChatId(555)).await);
    }

    #[tokio::test]
    async fn test_run_ticket_single_occupancy() {
        let gate = SessionGate::new();
        let ticket = gate.try_begin_run();
        assert!(ticket.is_some());
        // Second claim while the first ticket is alive is rejected.
        assert!(gate.try_begin_run().is_none());
        drop(ticket);
        assert!(gate.try_begin_run().is_some());
    }
}
