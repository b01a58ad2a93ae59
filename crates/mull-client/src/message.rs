//! Chat messages and request payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Author of a chat message.
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

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Name of the token budget field expected by the backend.
///
/// MLX-style servers read `max_new_tokens`, OpenAI-style servers read
/// `max_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenField {
    #[default]
    MaxNewTokens,
    MaxTokens,
}

impl TokenField {
    /// JSON key for this field.
    pub fn key(self) -> &'static str {
        match self {
            TokenField::MaxNewTokens => "max_new_tokens",
            TokenField::MaxTokens => "max_tokens",
        }
    }
}

impl FromStr for TokenField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "max_new_tokens" => Ok(TokenField::MaxNewTokens),
            "max_tokens" => Ok(TokenField::MaxTokens),
            other => Err(format!("unknown token field: {}", other)),
        }
    }
}

/// One call to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    /// Token budget for this call.
    pub max_tokens: u32,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub seed: Option<u64>,
}

impl GenerationRequest {
    /// Create a non-streaming request with no sampling overrides.
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
            stream: false,
            temperature: None,
            top_p: None,
            seed: None,
        }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32, seed: Option<u64>) -> Self {
        self.temperature = Some(temperature);
        self.top_p = Some(top_p);
        self.seed = seed;
        self
    }

    /// Build the JSON body, naming the token budget with `token_field`.
    pub fn to_body(&self, token_field: TokenField, model: Option<&str>) -> Value {
        let mut body = json!({
            "messages": self.messages,
            "stream": self.stream,
        });
        body[token_field.key()] = json!(self.max_tokens);
        if let Some(model) = model {
            body["model"] = json!(model);
        }
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(seed) = self.seed {
            body["seed"] = json!(seed);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = Message::assistant("hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_body_uses_configured_token_field() {
        let request = GenerationRequest::new(vec![Message::user("q")], 256);

        let body = request.to_body(TokenField::MaxNewTokens, None);
        assert_eq!(body["max_new_tokens"], json!(256));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("model").is_none());
        assert_eq!(body["stream"], json!(false));

        let body = request.to_body(TokenField::MaxTokens, Some("Qwen"));
        assert_eq!(body["max_tokens"], json!(256));
        assert_eq!(body["model"], json!("Qwen"));
    }

    #[test]
    fn test_body_sampling_fields() {
        let request = GenerationRequest::new(vec![], 10)
            .streaming(true)
            .with_sampling(0.5, 0.9, Some(7));
        let body = request.to_body(TokenField::MaxTokens, None);
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["seed"], json!(7));
        assert!(body["top_p"].as_f64().unwrap() > 0.89);
    }

    #[test]
    fn test_token_field_from_str() {
        assert_eq!("max_tokens".parse(), Ok(TokenField::MaxTokens));
        assert_eq!("max_new_tokens".parse(), Ok(TokenField::MaxNewTokens));
        assert!("tokens".parse::<TokenField>().is_err());
    }
}
