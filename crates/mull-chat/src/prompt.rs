//! Prompts for the recovery requests.

use mull_client::Message;

/// Instruction appended after a partial assistant reply.
pub const FINISH_INSTRUCTION: &str = "The assistant reply above may be cut off. \
Continue/finish it and provide ONLY the concise Final Answer (one short paragraph). \
Do NOT include your chain-of-thought.";

/// System prompt of the summarizer request.
pub const SUMMARIZER_SYSTEM_PROMPT: &str = "You are a concise assistant. \
Given Thinking text, output a single concise Final Answer paragraph and no chain-of-thought.";

/// Messages asking the model to finish a partial reply.
///
/// Carries the system prompt (if any), the latest user message, the partial
/// assistant buffer, and the finish instruction, in that order.
pub fn finish_messages(
    system: Option<&str>,
    last_user: Option<&str>,
    partial: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(4);
    if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
        messages.push(Message::system(system));
    }
    if let Some(user) = last_user {
        messages.push(Message::user(user));
    }
    messages.push(Message::assistant(partial));
    messages.push(Message::user(FINISH_INSTRUCTION));
    messages
}

/// Messages asking the model to condense thinking text into an answer.
pub fn summarize_messages(thinking: &str) -> Vec<Message> {
    vec![
        Message::system(SUMMARIZER_SYSTEM_PROMPT),
        Message::user(format!(
            "Thinking text:\n\n{}\n\nProduce a concise Final Answer (one short paragraph).",
            thinking
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mull_client::Role;

    #[test]
    fn test_finish_messages_order() {
        let messages = finish_messages(Some("be brief"), Some("why?"), "Thought: because");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[2].content, "Thought: because");
        assert_eq!(messages[3].content, FINISH_INSTRUCTION);
    }

    #[test]
    fn test_finish_messages_without_system() {
        let messages = finish_messages(None, Some("why?"), "partial");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn test_summarize_messages_embed_thinking() {
        let messages = summarize_messages("step one. step two.");
        assert_eq!(messages[0].content, SUMMARIZER_SYSTEM_PROMPT);
        assert!(messages[1].content.contains("step one. step two."));
    }
}
