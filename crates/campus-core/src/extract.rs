use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[a-zA-Z]*\s*|\s*```$").unwrap());
static JSON_BLOB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}|\[.*\]").unwrap());

/// Pulls the model-generated text out of a chat-completion reply envelope.
///
/// Checks `choices[0].message.content`, then `choices[0].text`; when neither
/// yields a string the whole reply is serialized and returned as the text,
/// so the caller always has something to log alongside the row.
pub fn response_text(reply: &Value) -> String {
    let candidate = reply
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|first| {
            let message_content = first
                .get("message")
                .and_then(Value::as_object)
                .and_then(|message| message.get("content"));
            match message_content {
                Some(content) => Some(content.clone()),
                None => first.get("text").cloned(),
            }
        });

    match candidate {
        Some(Value::String(text)) => text,
        _ => reply.to_string(),
    }
}

/// Best-effort JSON recovery from free-form model text.
///
/// Ordered chain of fallible attempts: strip a fenced-code marker, try a
/// direct parse, then scan for the first top-level `{...}` or `[...]`
/// substring. Only objects and arrays count as recovered; every failure
/// yields `None`, never an error.
pub fn recover_json(text: &str) -> Option<Value> {
    let stripped = FENCE.replace_all(text.trim(), "");

    if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
        if let Some(value) = structured(value) {
            return Some(value);
        }
    }

    let blob = JSON_BLOB.find(&stripped)?;
    serde_json::from_str::<Value>(blob.as_str())
        .ok()
        .and_then(structured)
}

fn structured(value: Value) -> Option<Value> {
    matches!(value, Value::Object(_) | Value::Array(_)).then_some(value)
}

/// Convenience wrapper: `(recovered JSON, original text)` for one reply.
pub fn extract_reply(reply: &Value) -> (Option<Value>, String) {
    let text = response_text(reply);
    let parsed = recover_json(&text);
    (parsed, text)
}
