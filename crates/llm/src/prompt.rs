//! Wire-level chat messages and prompt assembly

use std::fmt;

use serde::{Deserialize, Serialize};

use voice_gateway_core::{ReplyRequest, TurnRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Assemble the message list for a reply request
///
/// Order: the agent's system prompt, the recent conversation turns oldest
/// first, then the freshly transcribed utterance.
pub fn build_messages(request: &ReplyRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(Message::system(request.system_prompt.clone()));
    for turn in &request.history {
        messages.push(Message {
            role: turn.role.into(),
            content: turn.content.clone(),
        });
    }
    messages.push(Message::user(request.user_text.clone()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_core::Turn;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_build_messages_order() {
        let request = ReplyRequest::new("third question", "Be helpful").with_history(vec![
            Turn::user("first question"),
            Turn::assistant("first answer"),
        ]);

        let messages = build_messages(&request);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "first question");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].content, "third question");
        assert_eq!(messages[3].role, Role::User);
    }

    #[test]
    fn test_build_messages_without_history() {
        let request = ReplyRequest::new("hello", "Be helpful");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }
}
