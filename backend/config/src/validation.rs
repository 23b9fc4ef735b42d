//! Config validation: collects every problem in one pass.

use crate::schema::UarwatchConfig;
use thiserror::Error;

/// Store bounds above this are accepted but flagged.
pub const LARGE_MAX_ENTRIES: usize = 1_000_000;
pub const MIN_RESIZE_DEBOUNCE_MS: u64 = 500;
pub const MIN_INPUT_DEBOUNCE_MS: u64 = 1_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &UarwatchConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_store(config, &mut report);
    validate_logging(config, &mut report);
    validate_details(config, &mut report);
    validate_sink(config, &mut report);
    validate_api(config, &mut report);
    validate_hooks(config, &mut report);
    report
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

fn validate_store(config: &UarwatchConfig, report: &mut ValidationReport) {
    match config.max_entries {
        Some(0) => report.error("maxEntries", "maxEntries must be >= 1"),
        Some(n) if n > LARGE_MAX_ENTRIES => report.warn(
            "maxEntries",
            format!("maxEntries {n} keeps a very large in-memory log; export and search will be slow"),
        ),
        _ => {}
    }
}

fn validate_logging(config: &UarwatchConfig, report: &mut ValidationReport) {
    if let Some(level) = &config.log_level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.error(
                "logLevel",
                format!("Unknown log level '{level}'. Use one of: {}", LOG_LEVELS.join(", ")),
            );
        }
    }
}

fn validate_details(config: &UarwatchConfig, report: &mut ValidationReport) {
    let Some(details) = &config.details else { return };
    if details.max_depth == Some(0) {
        report.error("details.maxDepth", "maxDepth must be >= 1");
    }
    if let Some(bytes) = details.max_bytes {
        if bytes < 512 {
            report.warn(
                "details.maxBytes",
                format!("maxBytes {bytes} truncates almost every details bag"),
            );
        }
    }
}

fn validate_sink(config: &UarwatchConfig, report: &mut ValidationReport) {
    let Some(sink) = &config.sink else { return };
    if let Some(endpoint) = sink.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        if !is_http_url(endpoint) {
            report.error("sink.endpoint", format!("'{endpoint}' is not an http(s) URL"));
        }
    }
    if sink.timeout_ms == Some(0) {
        report.error("sink.timeoutMs", "timeoutMs must be > 0");
    }
}

fn validate_api(config: &UarwatchConfig, report: &mut ValidationReport) {
    let Some(api) = &config.api else { return };
    if let Some(origin) = api.origin.as_deref().filter(|o| !o.trim().is_empty()) {
        if !is_http_url(origin) {
            report.error("api.origin", format!("'{origin}' is not an http(s) URL"));
        }
    }
}

fn validate_hooks(config: &UarwatchConfig, report: &mut ValidationReport) {
    let Some(hooks) = &config.hooks else { return };
    if let Some(ms) = hooks.resize_debounce_ms {
        if ms < MIN_RESIZE_DEBOUNCE_MS {
            report.error(
                "hooks.resizeDebounceMs",
                format!("resizeDebounceMs must be >= {MIN_RESIZE_DEBOUNCE_MS}"),
            );
        }
    }
    if let Some(ms) = hooks.input_debounce_ms {
        if ms < MIN_INPUT_DEBOUNCE_MS {
            report.error(
                "hooks.inputDebounceMs",
                format!("inputDebounceMs must be >= {MIN_INPUT_DEBOUNCE_MS}"),
            );
        }
    }
    if hooks.memory_interval_secs == Some(0) {
        report.error("hooks.memoryIntervalSecs", "memoryIntervalSecs must be > 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{ApiConfig, HooksConfig, SinkConfig};

    #[test]
    fn defaulted_config_is_valid() {
        let report = validate(&apply_all_defaults(UarwatchConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_max_entries_is_error() {
        let cfg = UarwatchConfig {
            max_entries: Some(0),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "maxEntries");
    }

    #[test]
    fn huge_max_entries_is_warning() {
        let cfg = UarwatchConfig {
            max_entries: Some(5_000_000),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn short_debounces_are_errors() {
        let cfg = UarwatchConfig {
            hooks: Some(HooksConfig {
                resize_debounce_ms: Some(100),
                input_debounce_ms: Some(999),
                memory_interval_secs: Some(0),
                capture_panics: None,
            }),
            ..Default::default()
        };
        let paths: Vec<String> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "hooks.resizeDebounceMs",
                "hooks.inputDebounceMs",
                "hooks.memoryIntervalSecs"
            ]
        );
    }

    #[test]
    fn non_http_urls_are_errors() {
        let cfg = UarwatchConfig {
            sink: Some(SinkConfig {
                endpoint: Some("ftp://collector/logs".into()),
                timeout_ms: Some(1000),
            }),
            api: Some(ApiConfig {
                origin: Some("uar.example.com".into()),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].to_string().contains("sink.endpoint"));
    }

    #[test]
    fn unknown_log_level_is_error() {
        let cfg = UarwatchConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        assert!(!validate(&cfg).is_valid());
    }
}
