// Client-side conversation state.
//
// The conversation lives only in the client process; the relay never sees
// more than the trimmed window sent with each call.

use crate::web::models::{ChatMessage, Role};

/// How many user/assistant turns survive trimming.
pub const HISTORY_WINDOW: usize = 12;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a domain-specialized assistant fine-tuned for this deployment. \
     Answer concisely and factually, and say so when the answer is outside \
     your domain.";

pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Rebuild the outbound message list as `[system] + last N turns`.
    ///
    /// The system message is found by role wherever it sits and always lands
    /// first; only user/assistant turns are subject to the window. A default
    /// system prompt fills in when the history has none.
    pub fn trimmed_history(&self) -> Vec<ChatMessage> {
        let system = self
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .cloned()
            .unwrap_or_else(|| ChatMessage::system(DEFAULT_SYSTEM_PROMPT));

        let turns: Vec<ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect();
        let start = turns.len().saturating_sub(HISTORY_WINDOW);

        let mut out = Vec::with_capacity(1 + turns.len() - start);
        out.push(system);
        out.extend_from_slice(&turns[start..]);
        out
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}
