use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LogCategory, LogLevel, LogStatus};

/// Opaque structured payload attached to an entry.
///
/// A JSON object map: acyclic by construction, serialized for transport.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// Where an entry was emitted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    pub user_agent: String,
    pub url: String,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            user_agent: format!(
                "uarwatch/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            url: String::new(),
        }
    }
}

/// One immutable record of a single logged event.
///
/// Entries are created by the logging facade and shared as `Arc<LogEntry>`;
/// nothing mutates them after they are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub sequence_no: u64,
    /// `<YYYYMMDD><5-digit sequence>`
    pub process_id: String,
    pub user_id: String,
    pub module: String,
    pub function_name: String,
    /// `DD-MM-YYYY HH:MM:SS`, local time
    pub started_at: String,
    pub ended_at: String,
    pub status: LogStatus,
    pub details: Details,
    pub level: LogLevel,
    pub category: LogCategory,
    pub action: String,
    pub session_id: String,
    pub client_context: ClientContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Serialized details, used by free-text search.
    pub fn details_text(&self) -> String {
        serde_json::to_string(&self.details).unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LogEntry {
        let mut details = Details::new();
        details.insert("recordId".into(), json!("APP-001"));
        LogEntry {
            sequence_no: 1_700_000_000_000_123,
            process_id: "2026101800001".into(),
            user_id: "system".into(),
            module: "System".into(),
            function_name: "login".into(),
            started_at: "18-10-2026 09:15:00".into(),
            ended_at: "18-10-2026 09:15:00".into(),
            status: LogStatus::Success,
            details,
            level: LogLevel::Info,
            category: LogCategory::Security,
            action: "login".into(),
            session_id: "session_1_abc".into(),
            client_context: ClientContext::default(),
            duration: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"processId\":\"2026101800001\""));
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"clientContext\""));
        assert!(json.contains("\"category\":\"security\""));
        assert!(!json.contains("\"duration\""));
    }

    #[test]
    fn test_details_text_contains_values() {
        assert!(sample().details_text().contains("APP-001"));
    }

    #[test]
    fn test_default_client_context_names_the_agent() {
        let ctx = ClientContext::default();
        assert!(ctx.user_agent.starts_with("uarwatch/"));
        assert!(ctx.url.is_empty());
    }
}
