//! In-memory conversation log
//!
//! Keeps a bounded window of recent turns per conversation id so the reply
//! stage can continue a dialogue across requests. Entries live for the
//! process lifetime; the window bound keeps memory flat.

use dashmap::DashMap;

use voice_gateway_core::Turn;

/// Bounded per-conversation turn history
pub struct ConversationLog {
    turns: DashMap<String, Vec<Turn>>,
    max_turns: usize,
}

impl ConversationLog {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: DashMap::new(),
            max_turns,
        }
    }

    /// Recent turns for a conversation, oldest first
    pub fn recent(&self, conversation_id: &str) -> Vec<Turn> {
        self.turns
            .get(conversation_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Record one user/assistant exchange
    pub fn record_exchange(&self, conversation_id: &str, user_text: &str, reply_text: &str) {
        let mut entry = self
            .turns
            .entry(conversation_id.to_string())
            .or_default();
        entry.push(Turn::user(user_text));
        entry.push(Turn::assistant(reply_text));

        let len = entry.len();
        if len > self.max_turns {
            entry.drain(0..len - self.max_turns);
        }
    }

    /// Number of tracked conversations
    pub fn conversation_count(&self) -> usize {
        self.turns.len()
    }
}
