//! Chat assistant state: message history with SQLite persistence.
//!
//! The assistant itself lives on the backend; this module keeps the
//! conversation transcript, seeds an empty history with the canned
//! greeting, and survives process restarts.

use crate::storage::{Database, StoredMessage};
use anyhow::Result;

/// Canned greeting that seeds an empty conversation and survives
/// "clear chat".
pub const GREETING: &str = "This chat provides updates on the humanitarian situation in Gaza based on the latest information available on the web, Telegram, Twitter, and YouTube.\nYou can ask questions like:\n1. What is the situation of the water in the Gaza Strip?\n2. How many trucks entered yesterday?\n3. What is the situation of starvation in Rafah?";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Api,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Api => "api",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "user" => Role::User,
            _ => Role::Api,
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub role: Role,
    pub text: String,
}

impl From<StoredMessage> for ChatMessage {
    fn from(stored: StoredMessage) -> Self {
        Self {
            id: stored.id,
            role: Role::from_str(&stored.role),
            text: stored.text,
        }
    }
}

/// Conversation history bound to the persistence layer.
pub struct ChatHistory {
    db: Database,
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Load the transcript, seeding the greeting when empty.
    pub async fn load(db: Database) -> Result<Self> {
        let mut history = Self {
            db,
            messages: Vec::new(),
        };
        let stored = history.db.load_messages().await?;
        if stored.is_empty() {
            history.push(Role::Api, GREETING.to_string()).await?;
        } else {
            history.messages = stored.into_iter().map(ChatMessage::from).collect();
        }
        Ok(history)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a message and persist it.
    pub async fn push(&mut self, role: Role, text: String) -> Result<()> {
        let id = self.db.append_message(role.as_str(), &text).await?;
        self.messages.push(ChatMessage { id, role, text });
        Ok(())
    }

    /// Reset the transcript to the greeting alone.
    pub async fn clear(&mut self) -> Result<()> {
        self.db.clear_messages().await?;
        self.messages.clear();
        self.push(Role::Api, GREETING.to_string()).await
    }
}
