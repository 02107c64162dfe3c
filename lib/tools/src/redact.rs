//! Log-safe previews of tool parameters.

use serde_json::{Map, Value as JsonValue};

/// Parameters masked before logging.
const SENSITIVE: [&str; 3] = ["phone_number", "email", "customer_name"];

/// Maximum preview length, in characters.
pub const PREVIEW_LIMIT: usize = 256;

fn mask(value: &JsonValue) -> JsonValue {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => return JsonValue::Null,
        other => other.to_string(),
    };
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return JsonValue::String("***".to_string());
    }
    let tail: String = chars[chars.len() - 2..].iter().collect();
    JsonValue::String(format!("***{tail}"))
}

/// Renders parameters for logs with PII masked, truncated to
/// [`PREVIEW_LIMIT`] characters.
#[must_use]
pub fn preview(parameters: &Map<String, JsonValue>) -> String {
    let masked: Map<String, JsonValue> = parameters
        .iter()
        .map(|(name, value)| {
            let value = if SENSITIVE.contains(&name.as_str()) {
                mask(value)
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect();

    let rendered = JsonValue::Object(masked).to_string();
    if rendered.chars().count() <= PREVIEW_LIMIT {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(PREVIEW_LIMIT).collect();
    truncated.push_str("...");
    truncated
}
