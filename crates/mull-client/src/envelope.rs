//! Extraction of generated text from backend response objects.

use serde_json::Value;

/// Top-level keys probed for generated text, in priority order.
const TEXT_KEYS: &[&str] = &["response", "text", "content", "generated_text", "token"];

/// Find the generated text in a response object.
///
/// Flat keys are probed first, then the OpenAI-style `choices[0]` shapes
/// (`message.content`, `delta.content`, `text`). The first non-empty string
/// wins. Non-objects yield `None`.
pub fn extract_text(value: &Value) -> Option<&str> {
    let object = value.as_object()?;

    for key in TEXT_KEYS {
        if let Some(text) = object.get(*key).and_then(text_of) {
            return Some(text);
        }
    }

    let choice = object.get("choices")?.as_array()?.first()?;
    [
        choice.pointer("/message/content"),
        choice.pointer("/delta/content"),
        choice.get("text"),
    ]
    .into_iter()
    .flatten()
    .find_map(text_of)
}

/// Generated text of a complete (non-streaming) response body.
///
/// A body that is not JSON is taken as plain text.
pub fn text_from_body(body: &str) -> Option<String> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(value) => extract_text(&value)?.to_string(),
        Err(_) => body.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn text_of(value: &Value) -> Option<&str> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(inner) => inner.get("content")?.as_str()?,
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_keys() {
        assert_eq!(extract_text(&json!({"response": "a"})), Some("a"));
        assert_eq!(extract_text(&json!({"text": "b"})), Some("b"));
        assert_eq!(extract_text(&json!({"content": "c"})), Some("c"));
        assert_eq!(extract_text(&json!({"generated_text": "d"})), Some("d"));
        assert_eq!(extract_text(&json!({"token": "e"})), Some("e"));
    }

    #[test]
    fn test_priority_order() {
        let value = json!({"text": "second", "response": "first"});
        assert_eq!(extract_text(&value), Some("first"));

        let value = json!({"response": "", "text": "fallback"});
        assert_eq!(extract_text(&value), Some("fallback"));
    }

    #[test]
    fn test_openai_shapes() {
        let message = json!({"choices": [{"message": {"role": "assistant", "content": "m"}}]});
        assert_eq!(extract_text(&message), Some("m"));

        let delta = json!({"choices": [{"delta": {"content": "d"}, "finish_reason": null}]});
        assert_eq!(extract_text(&delta), Some("d"));

        let legacy = json!({"choices": [{"text": "t"}]});
        assert_eq!(extract_text(&legacy), Some("t"));

        let role_only = json!({"choices": [{"delta": {"role": "assistant"}}]});
        assert_eq!(extract_text(&role_only), None);
    }

    #[test]
    fn test_nested_content_object() {
        let value = json!({"content": {"content": "inner"}});
        assert_eq!(extract_text(&value), Some("inner"));
    }

    #[test]
    fn test_no_text() {
        assert_eq!(extract_text(&json!({"done": true})), None);
        assert_eq!(extract_text(&json!({"choices": []})), None);
        assert_eq!(extract_text(&json!("bare string")), None);
        assert_eq!(extract_text(&json!({"response": 5})), None);
    }

    #[test]
    fn test_text_from_body() {
        assert_eq!(
            text_from_body(r#"{"response": " hi "}"#).as_deref(),
            Some("hi")
        );
        assert_eq!(text_from_body("plain words").as_deref(), Some("plain words"));
        assert_eq!(text_from_body(r#"{"response": ""}"#), None);
        assert_eq!(text_from_body("   "), None);
    }
}
