//! Humanizes raw inbound payloads for the scrollback.
//!
//! Each payload carries a four-character type prefix, a colon, and a JSON
//! body. A payload that cannot be decoded is returned verbatim rather than
//! dropped, so the operator always sees something.

use proto::{MessageCategory, wire};
use serde_json::Value;

/// A formatted inbound message: display text plus its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    /// Human-readable text, possibly multi-line.
    pub text: String,
    /// Category used for suppression decisions.
    pub category: MessageCategory,
}

/// Formats one raw payload into display text and a category.
pub fn format_payload(raw: &str) -> FormattedMessage {
    // The server pads frames with NUL bytes; strip them before anything else.
    let raw: String = raw.chars().filter(|c| *c != '\u{0}').collect();

    let Some((prefix, body)) = split_prefix(&raw) else {
        return FormattedMessage {
            text: raw,
            category: MessageCategory::Other,
        };
    };

    let (heading, category) = match prefix {
        wire::ANIMATION_DATA_PREFIX => ("Animation data", MessageCategory::AnimationData),
        wire::ANIMATION_INFO_PREFIX => ("Animation info", MessageCategory::AnimationInfo),
        wire::STRIP_INFO_PREFIX => ("Strip info", MessageCategory::StripInfo),
        wire::SECTION_PREFIX => ("Strip section", MessageCategory::Section),
        wire::END_ANIMATION_PREFIX => ("End of animation", MessageCategory::EndAnimation),
        _ => {
            return FormattedMessage {
                text: raw,
                category: MessageCategory::Other,
            };
        }
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let mut text = heading.to_string();
            if let Some(name) = name_field(&map) {
                text.push_str(&format!(" for {name}"));
            }
            for (key, value) in &map {
                text.push_str(&format!("\n  {key}: {}", render_value(value)));
            }
            FormattedMessage { text, category }
        }
        Ok(value) => FormattedMessage {
            text: format!("{heading}: {}", render_value(&value)),
            category,
        },
        // Malformed body: show the payload verbatim, never suppress it.
        Err(_) => FormattedMessage {
            text: raw,
            category: MessageCategory::Other,
        },
    }
}

/// Splits a payload into its four-character type prefix and JSON body.
fn split_prefix(raw: &str) -> Option<(&str, &str)> {
    if raw.len() <= wire::TYPE_PREFIX_LEN {
        return None;
    }
    if !raw.is_char_boundary(wire::TYPE_PREFIX_LEN) {
        return None;
    }
    let (prefix, rest) = raw.split_at(wire::TYPE_PREFIX_LEN);
    let body = rest.strip_prefix(':')?;
    Some((prefix, body))
}

/// Picks the field used in the heading, preferring explicit names over ids.
fn name_field(map: &serde_json::Map<String, Value>) -> Option<String> {
    for key in ["name", "animation", "id"] {
        if let Some(Value::String(s)) = map.get(key)
            && !s.is_empty()
        {
            return Some(s.clone());
        }
    }
    None
}

/// Renders a JSON value as a single scrollback-friendly token.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
