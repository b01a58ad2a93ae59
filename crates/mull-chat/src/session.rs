//! Conversation transcript.

use mull_client::{Message, Role};

/// Ordered chat history owned by the caller.
///
/// The system prompt, when present, is always the first message. Everything
/// after it is appended in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.set_system_prompt(prompt);
        transcript
    }

    /// Replace the system prompt in place, or insert it first.
    ///
    /// A blank prompt removes it.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        let has_system = self.system().is_some();

        if prompt.trim().is_empty() {
            if has_system {
                self.messages.remove(0);
            }
        } else if has_system {
            self.messages[0].content = prompt;
        } else {
            self.messages.insert(0, Message::system(prompt));
        }
    }

    pub fn system(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the most recent user message.
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop every message except the system prompt.
    pub fn reset(&mut self) {
        let keep = usize::from(self.system().is_some());
        self.messages.truncate(keep);
    }

    /// Remove the trailing exchange and return its user text for resubmission.
    ///
    /// A trailing assistant message is removed together with the user
    /// message before it. Returns `None` when there is no user message to
    /// take back.
    pub fn pop_last_exchange(&mut self) -> Option<String> {
        if self.messages.last().map(|m| m.role) == Some(Role::Assistant) {
            self.messages.pop();
        }
        if self.messages.last().map(|m| m.role) == Some(Role::User) {
            return self.messages.pop().map(|m| m.content);
        }
        None
    }
}
