//! Details sanitation.
//!
//! Scrubs bearer tokens and API keys from strings, masks values stored under
//! sensitive keys, and enforces the depth and size ceiling on the details bag
//! so `export()` and free-text search stay bounded.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};
use uarwatch_core::Details;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Keys whose values are never stored verbatim.
static SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "authtoken",
    "accesstoken",
    "refreshtoken",
    "secret",
    "authorization",
    "apikey",
    "cookie",
];

pub const DEFAULT_MAX_DEPTH: usize = 8;
pub const DEFAULT_MAX_BYTES: usize = 16 * 1024;
const PREVIEW_CHARS: usize = 512;

/// Ceiling applied to every details bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailsLimits {
    pub max_depth: usize,
    pub max_bytes: usize,
}

impl Default for DetailsLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Redacts token patterns inside a string.
pub fn redact_sensitive_data(input: &str) -> String {
    API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]").to_string()
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|k| normalized == *k)
}

/// Redact and bound a details bag.
pub fn sanitize_details(details: Details, limits: DetailsLimits) -> Details {
    let mut out = Map::new();
    for (key, value) in details {
        let cleaned = if is_sensitive_key(&key) {
            Value::String("***".to_string())
        } else {
            sanitize_value(value, 1, limits.max_depth)
        };
        out.insert(key, cleaned);
    }

    let size = serde_json::to_string(&out).map(|s| s.len()).unwrap_or(0);
    if size > limits.max_bytes {
        let serialized = serde_json::to_string(&out).unwrap_or_default();
        let preview: String = serialized.chars().take(PREVIEW_CHARS).collect();
        let mut truncated = Map::new();
        truncated.insert("_truncated".to_string(), json!(true));
        truncated.insert("originalBytes".to_string(), json!(size));
        truncated.insert("preview".to_string(), Value::String(preview));
        return truncated;
    }
    out
}

fn sanitize_value(value: Value, depth: usize, max_depth: usize) -> Value {
    match value {
        Value::String(s) => Value::String(redact_sensitive_data(&s)),
        Value::Array(items) if depth >= max_depth && !items.is_empty() => {
            Value::String("[depth limit]".to_string())
        }
        Value::Object(map) if depth >= max_depth && !map.is_empty() => {
            Value::String("[depth limit]".to_string())
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| sanitize_value(v, depth + 1, max_depth))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, v) in map {
                let cleaned = if is_sensitive_key(&key) {
                    Value::String("***".to_string())
                } else {
                    sanitize_value(v, depth + 1, max_depth)
                };
                out.insert(key, cleaned);
            }
            Value::Object(out)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(value: Value) -> Details {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_redaction() {
        let raw = "Calling with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn test_sensitive_keys_are_masked_at_any_depth() {
        let d = details(json!({
            "password": "hunter2",
            "form": { "auth_token": "abc", "name": "reviewer" }
        }));
        let clean = sanitize_details(d, DetailsLimits::default());
        assert_eq!(clean["password"], "***");
        assert_eq!(clean["form"]["auth_token"], "***");
        assert_eq!(clean["form"]["name"], "reviewer");
    }

    #[test]
    fn test_depth_limit() {
        let d = details(json!({ "a": { "b": { "c": { "d": 1 } } } }));
        let clean = sanitize_details(d, DetailsLimits { max_depth: 2, max_bytes: 1024 });
        assert_eq!(clean["a"]["b"], "[depth limit]");
    }

    #[test]
    fn test_size_limit_replaces_bag() {
        let big = "x".repeat(4096);
        let d = details(json!({ "blob": big }));
        let clean = sanitize_details(d, DetailsLimits { max_depth: 8, max_bytes: 1024 });
        assert_eq!(clean["_truncated"], true);
        assert!(clean["preview"].as_str().unwrap().len() <= 512);
    }

    #[test]
    fn test_small_bags_pass_through() {
        let d = details(json!({ "recordId": "APP-1", "count": 3, "ok": true }));
        let clean = sanitize_details(d.clone(), DetailsLimits::default());
        assert_eq!(clean, d);
    }
}
