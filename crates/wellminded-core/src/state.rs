//! UI-agnostic chat state types
//!
//! These data structures are shared by every front-end and don't depend on
//! any specific UI framework.

use serde::{Deserialize, Serialize};

/// A single entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Agent,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Agent => "Emoting",
        }
    }
}

/// Ordered, append-only list of chat messages.
///
/// Entries only ever arrive in pairs (the user's message, then the reply)
/// and are never removed or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and its reply together.
    pub fn push_exchange(&mut self, user_text: impl Into<String>, reply_text: impl Into<String>) {
        self.messages.reserve(2);
        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: user_text.into(),
        });
        self.messages.push(ChatMessage {
            sender: Sender::Agent,
            text: reply_text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
