//! Filtering and free-text search over store snapshots.
//!
//! Every present filter field is an AND-conjunctive predicate; absent fields
//! do not filter. Queries never touch the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uarwatch_core::{LogCategory, LogEntry, LogLevel};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<LogCategory>,
    /// Case-insensitive substring of `action`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Inclusive lower bound on `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of `action` or serialized `details`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn category(mut self, category: LogCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn action_contains(mut self, needle: impl Into<String>) -> Self {
        self.action_contains = Some(needle.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when `entry` satisfies every field that is set.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.level.is_some_and(|l| l != entry.level) {
            return false;
        }
        if self.category.is_some_and(|c| c != entry.category) {
            return false;
        }
        if let Some(user) = &self.user_id {
            if *user != entry.user_id {
                return false;
            }
        }
        if let Some(needle) = non_blank(&self.action_contains) {
            if !contains_ci(&entry.action, needle) {
                return false;
            }
        }
        if self.from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.timestamp > to) {
            return false;
        }
        if let Some(text) = non_blank(&self.search) {
            if !contains_ci(&entry.action, text) && !contains_ci(&entry.details_text(), text) {
                return false;
            }
        }
        true
    }
}

/// Re-sort `entries` newest first (stable, so ties keep insertion order) and
/// keep those matching `filter`.
pub fn query(entries: &[Arc<LogEntry>], filter: &LogFilter) -> Vec<Arc<LogEntry>> {
    let mut sorted: Vec<Arc<LogEntry>> = entries.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if filter.is_empty() {
        return sorted;
    }
    sorted.retain(|e| filter.matches(e));
    sorted
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::entry;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn fixture() -> Vec<Arc<LogEntry>> {
        let mut login = (*entry("Login Attempt", LogLevel::Info, LogCategory::Security, 1)).clone();
        login.user_id = "alice".into();
        login.details.insert("ip".into(), json!("10.0.0.7"));

        let mut failed = (*entry("login_failed", LogLevel::Error, LogCategory::Security, 2)).clone();
        failed.user_id = "bob".into();

        let mut create = (*entry("Create Application", LogLevel::Info, LogCategory::UserAction, 3)).clone();
        create.user_id = "alice".into();
        create.details.insert("recordId".into(), json!("APP-42"));

        let api = entry("GET /api/apps", LogLevel::Error, LogCategory::ApiCall, 4);

        // stored newest first
        vec![
            api,
            Arc::new(create),
            Arc::new(failed),
            Arc::new(login),
        ]
    }

    fn actions(entries: &[Arc<LogEntry>]) -> Vec<&str> {
        entries.iter().map(|e| e.action.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything_newest_first() {
        let all = query(&fixture(), &LogFilter::new());
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].action, "GET /api/apps");
    }

    #[test]
    fn test_resorts_out_of_order_input() {
        let mut entries = fixture();
        entries.reverse();
        let all = query(&entries, &LogFilter::new());
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let newer = entry("second", LogLevel::Info, LogCategory::System, 5);
        let mut twin = (*entry("first", LogLevel::Info, LogCategory::System, 5)).clone();
        twin.process_id = "2026101800099".into();
        let older = entry("oldest", LogLevel::Info, LogCategory::System, 1);

        let stored = vec![newer, Arc::new(twin), older];
        let all = query(&stored, &LogFilter::new());
        assert_eq!(actions(&all), vec!["second", "first", "oldest"]);

        let info = query(&stored, &LogFilter::new().level(LogLevel::Info));
        assert_eq!(actions(&info), vec!["second", "first", "oldest"]);
    }

    #[test]
    fn test_level_and_category_are_exact() {
        let errors = query(&fixture(), &LogFilter::new().level(LogLevel::Error));
        assert_eq!(actions(&errors), vec!["GET /api/apps", "login_failed"]);

        let security = query(&fixture(), &LogFilter::new().category(LogCategory::Security));
        assert_eq!(actions(&security), vec!["login_failed", "Login Attempt"]);
    }

    #[test]
    fn test_action_contains_is_case_insensitive() {
        let hits = query(&fixture(), &LogFilter::new().action_contains("LOGIN"));
        assert_eq!(actions(&hits), vec!["login_failed", "Login Attempt"]);
    }

    #[test]
    fn test_search_covers_details() {
        let hits = query(&fixture(), &LogFilter::new().search("app-42"));
        assert_eq!(actions(&hits), vec!["Create Application"]);
    }

    #[test]
    fn test_time_bounds_are_inclusive() {
        let base = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let filter = LogFilter::new()
            .from(base + Duration::seconds(2))
            .to(base + Duration::seconds(3));
        let hits = query(&fixture(), &filter);
        assert_eq!(actions(&hits), vec!["Create Application", "login_failed"]);
    }

    #[test]
    fn test_blank_text_fields_do_not_filter() {
        let hits = query(&fixture(), &LogFilter::new().search("  ").action_contains(""));
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn test_conjunction_is_subset_of_each_field() {
        let entries = fixture();
        let f1 = LogFilter::new().user_id("alice");
        let f2 = LogFilter::new().category(LogCategory::UserAction);
        let both = LogFilter::new().user_id("alice").category(LogCategory::UserAction);

        let only1 = query(&entries, &f1);
        let only2 = query(&entries, &f2);
        let combined = query(&entries, &both);

        assert_eq!(actions(&combined), vec!["Create Application"]);
        for e in &combined {
            assert!(only1.iter().any(|x| Arc::ptr_eq(x, e)));
            assert!(only2.iter().any(|x| Arc::ptr_eq(x, e)));
        }
    }

    #[test]
    fn test_filter_deserializes_permissively() {
        let filter: LogFilter = serde_json::from_value(json!({ "userId": "bob" })).unwrap();
        let hits = query(&fixture(), &filter);
        assert_eq!(actions(&hits), vec!["login_failed"]);
    }
}
