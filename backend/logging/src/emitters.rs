//! Domain emitters: typed shorthands over `LoggingService::log`.

use std::sync::Arc;

use serde_json::json;
use uarwatch_core::{AuthAction, DataOperation, Details, LogCategory, LogEntry, LogLevel, LogStatus};

use crate::service::{LogRecord, LoggingService};

/// HTTP statuses at or above this are recorded as failures.
const HTTP_ERROR_THRESHOLD: u16 = 400;

impl LoggingService {
    pub fn log_user_action(
        &self,
        action: impl Into<String>,
        details: Details,
        user_id: Option<&str>,
        module: Option<&str>,
    ) -> Option<Arc<LogEntry>> {
        let mut record = LogRecord::info(LogCategory::UserAction, action)
            .details(details)
            .user_opt(user_id.map(str::to_string));
        if let Some(module) = module {
            record = record.module(module);
        }
        self.log(record)
    }

    /// Record one HTTP exchange. `status >= 400` is an error entry.
    pub fn log_api_call(
        &self,
        method: &str,
        url: &str,
        status: Option<u16>,
        duration_ms: Option<f64>,
        mut details: Details,
    ) -> Option<Arc<LogEntry>> {
        let method = method.to_ascii_uppercase();
        let failed = status.is_some_and(|s| s >= HTTP_ERROR_THRESHOLD);
        let (level, entry_status) = if failed {
            (LogLevel::Error, LogStatus::Error)
        } else {
            (LogLevel::Info, LogStatus::Success)
        };

        details.insert("method".into(), json!(method));
        details.insert("url".into(), json!(url));
        if let Some(status) = status {
            details.insert("status".into(), json!(status));
        }

        let mut record = LogRecord::new(level, LogCategory::ApiCall, format!("{method} {url}"))
            .details(details)
            .module("API")
            .function(method.clone())
            .status(entry_status);
        if let Some(ms) = duration_ms {
            record = record.duration_ms(ms);
        }
        self.log(record)
    }

    pub fn log_navigation(&self, from: &str, to: &str, mut details: Details) -> Option<Arc<LogEntry>> {
        details.insert("from".into(), json!(from));
        details.insert("to".into(), json!(to));
        self.log(
            LogRecord::info(LogCategory::Navigation, "navigate")
                .details(details)
                .module("Router"),
        )
    }

    pub fn log_performance(
        &self,
        action: impl Into<String>,
        duration_ms: f64,
        mut details: Details,
    ) -> Option<Arc<LogEntry>> {
        details.insert("durationMs".into(), json!(duration_ms));
        self.log(
            LogRecord::info(LogCategory::Performance, action)
                .details(details)
                .module("Performance")
                .duration_ms(duration_ms),
        )
    }

    /// Action reads `"<Operation> <module>"`, e.g. `"Update Applications"`.
    pub fn log_data_change(
        &self,
        operation: DataOperation,
        module: &str,
        record_id: &str,
        mut details: Details,
        user_id: Option<&str>,
    ) -> Option<Arc<LogEntry>> {
        details.insert("operation".into(), json!(operation.as_str()));
        details.insert("recordId".into(), json!(record_id));
        self.log(
            LogRecord::info(LogCategory::UserAction, format!("{} {module}", operation.as_str()))
                .details(details)
                .module(module)
                .function(operation.as_str().to_ascii_lowercase())
                .user_opt(user_id.map(str::to_string)),
        )
    }

    /// Level follows `status`: Error is error, Warning is warn, anything else info.
    pub fn log_security_event(
        &self,
        event: impl Into<String>,
        details: Details,
        user_id: Option<&str>,
        status: LogStatus,
    ) -> Option<Arc<LogEntry>> {
        self.log(
            LogRecord::new(status.security_level(), LogCategory::Security, event)
                .details(details)
                .module("Security")
                .user_opt(user_id.map(str::to_string))
                .status(status),
        )
    }

    pub fn log_authentication(
        &self,
        action: AuthAction,
        details: Details,
        user_id: Option<&str>,
    ) -> Option<Arc<LogEntry>> {
        self.log_security_event(action.as_str(), details, user_id, action.status())
    }
}
