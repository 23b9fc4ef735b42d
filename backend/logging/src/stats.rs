//! Aggregate counts over a store snapshot.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uarwatch_core::{LogCategory, LogEntry, LogLevel};

/// Number of actions reported in `top_actions`.
pub const TOP_ACTIONS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: usize,
    pub by_level: BTreeMap<LogLevel, usize>,
    pub by_category: BTreeMap<LogCategory, usize>,
    pub top_actions: Vec<ActionCount>,
    pub errors: usize,
    pub warnings: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub session_id: String,
}

impl LogStats {
    /// Aggregate `entries` (a newest-first snapshot).
    ///
    /// Ties in `top_actions` keep the order in which actions were first seen
    /// while walking the snapshot.
    pub fn from_entries(entries: &[Arc<LogEntry>], session_id: &str) -> Self {
        let mut stats = Self {
            total: entries.len(),
            session_id: session_id.to_string(),
            ..Default::default()
        };

        let mut action_counts: Vec<ActionCount> = Vec::new();
        let mut action_index: HashMap<&str, usize> = HashMap::new();

        for entry in entries {
            *stats.by_level.entry(entry.level).or_default() += 1;
            *stats.by_category.entry(entry.category).or_default() += 1;

            match action_index.get(entry.action.as_str()) {
                Some(&i) => action_counts[i].count += 1,
                None => {
                    action_index.insert(entry.action.as_str(), action_counts.len());
                    action_counts.push(ActionCount {
                        action: entry.action.clone(),
                        count: 1,
                    });
                }
            }

            stats.oldest = Some(stats.oldest.map_or(entry.timestamp, |t| t.min(entry.timestamp)));
            stats.newest = Some(stats.newest.map_or(entry.timestamp, |t| t.max(entry.timestamp)));
        }

        // stable: equal counts stay in first-seen order
        action_counts.sort_by(|a, b| b.count.cmp(&a.count));
        action_counts.truncate(TOP_ACTIONS);
        stats.top_actions = action_counts;

        stats.errors = stats.by_level.get(&LogLevel::Error).copied().unwrap_or(0);
        stats.warnings = stats.by_level.get(&LogLevel::Warn).copied().unwrap_or(0);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::entry;

    #[test]
    fn test_counts_by_level() {
        let entries = vec![
            entry("a", LogLevel::Error, LogCategory::System, 3),
            entry("b", LogLevel::Info, LogCategory::System, 2),
            entry("c", LogLevel::Info, LogCategory::UserAction, 1),
        ];
        let stats = LogStats::from_entries(&entries, "session_x");

        let expected: BTreeMap<LogLevel, usize> =
            [(LogLevel::Info, 2), (LogLevel::Error, 1)].into_iter().collect();
        assert_eq!(stats.by_level, expected);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.warnings, 0);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category.get(&LogCategory::System), Some(&2));
        assert_eq!(stats.session_id, "session_x");
    }

    #[test]
    fn test_empty_store_has_no_extent() {
        let stats = LogStats::from_entries(&[], "s");
        assert_eq!(stats.total, 0);
        assert!(stats.oldest.is_none());
        assert!(stats.newest.is_none());
        assert!(stats.by_level.is_empty());
    }

    #[test]
    fn test_extent_tracks_timestamps() {
        let entries = vec![
            entry("x", LogLevel::Info, LogCategory::System, 9),
            entry("x", LogLevel::Info, LogCategory::System, 4),
        ];
        let stats = LogStats::from_entries(&entries, "s");
        assert_eq!(stats.newest, Some(entries[0].timestamp));
        assert_eq!(stats.oldest, Some(entries[1].timestamp));
    }

    #[test]
    fn test_top_actions_ordering_and_ties() {
        let entries = vec![
            entry("beta", LogLevel::Info, LogCategory::System, 6),
            entry("alpha", LogLevel::Info, LogCategory::System, 5),
            entry("gamma", LogLevel::Info, LogCategory::System, 4),
            entry("gamma", LogLevel::Info, LogCategory::System, 3),
            entry("alpha", LogLevel::Info, LogCategory::System, 2),
            entry("beta", LogLevel::Info, LogCategory::System, 1),
            entry("gamma", LogLevel::Info, LogCategory::System, 0),
        ];
        let stats = LogStats::from_entries(&entries, "s");
        let names: Vec<&str> = stats.top_actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(names, vec!["gamma", "beta", "alpha"]);
        assert_eq!(stats.top_actions[0].count, 3);
    }

    #[test]
    fn test_top_actions_capped() {
        let entries: Vec<_> = (0..25)
            .map(|i| entry(&format!("action-{i}"), LogLevel::Debug, LogCategory::System, i))
            .collect();
        let stats = LogStats::from_entries(&entries, "s");
        assert_eq!(stats.top_actions.len(), TOP_ACTIONS);
    }
}
