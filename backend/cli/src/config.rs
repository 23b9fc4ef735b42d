use std::path::PathBuf;
use std::time::Duration;

use uarwatch_config::defaults::{
    DEFAULT_DETAILS_MAX_BYTES, DEFAULT_DETAILS_MAX_DEPTH, DEFAULT_INPUT_DEBOUNCE_MS,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_ENTRIES, DEFAULT_MEMORY_INTERVAL_SECS,
    DEFAULT_RESIZE_DEBOUNCE_MS, DEFAULT_SINK_TIMEOUT_MS,
};
use uarwatch_config::UarwatchConfig;
use uarwatch_core::ClientContext;
use uarwatch_hooks::HookSettings;
use uarwatch_logging::{DetailsLimits, LoggerOptions};

/// Runtime settings resolved from a prepared `UarwatchConfig`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub logger: LoggerOptions,
    pub sink_endpoint: Option<String>,
    pub sink_timeout: Duration,
    /// Own API origin; when set, outbound calls through the pipeline's
    /// transport are intercepted and logged.
    pub api_origin: Option<String>,
    pub hooks: HookSettings,
}

impl Settings {
    pub fn from_config(cfg: &UarwatchConfig) -> Self {
        let details = cfg.details.clone().unwrap_or_default();
        let sink = cfg.sink.clone().unwrap_or_default();
        let hooks = cfg.hooks.clone().unwrap_or_default();
        let ctx = cfg.client_context.clone().unwrap_or_default();
        let api = cfg.api.clone().unwrap_or_default();

        let mut client_context = ClientContext::default();
        if let Some(agent) = ctx.user_agent.filter(|a| !a.is_empty()) {
            client_context.user_agent = agent;
        }
        if let Some(url) = ctx.url {
            client_context.url = url;
        }

        Self {
            log_level: cfg
                .log_level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_dir: cfg.log_dir.as_ref().filter(|d| !d.is_empty()).map(PathBuf::from),
            logger: LoggerOptions {
                max_entries: cfg.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
                enabled: cfg.enabled.unwrap_or(true),
                mirror_to_tracing: cfg.mirror_to_tracing.unwrap_or(false),
                details: DetailsLimits {
                    max_depth: details.max_depth.unwrap_or(DEFAULT_DETAILS_MAX_DEPTH),
                    max_bytes: details.max_bytes.unwrap_or(DEFAULT_DETAILS_MAX_BYTES),
                },
                client_context,
            },
            sink_endpoint: sink.endpoint.filter(|e| !e.trim().is_empty()),
            sink_timeout: Duration::from_millis(sink.timeout_ms.unwrap_or(DEFAULT_SINK_TIMEOUT_MS)),
            api_origin: api.origin.filter(|o| !o.trim().is_empty()),
            hooks: HookSettings {
                resize_debounce: Duration::from_millis(
                    hooks.resize_debounce_ms.unwrap_or(DEFAULT_RESIZE_DEBOUNCE_MS),
                ),
                input_debounce: Duration::from_millis(
                    hooks.input_debounce_ms.unwrap_or(DEFAULT_INPUT_DEBOUNCE_MS),
                ),
                memory_interval: Duration::from_secs(
                    hooks
                        .memory_interval_secs
                        .unwrap_or(DEFAULT_MEMORY_INTERVAL_SECS),
                ),
                capture_panics: hooks.capture_panics.unwrap_or(false),
            },
        }
    }

    /// Longest pending debounce; events published before shutdown need this
    /// long to land.
    pub fn drain_period(&self) -> Duration {
        self.hooks.resize_debounce.max(self.hooks.input_debounce) + Duration::from_millis(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uarwatch_config::{apply_all_defaults, ApiConfig, ClientContextConfig, HooksConfig, SinkConfig};

    #[test]
    fn defaults_map_to_runtime_values() {
        let settings = Settings::from_config(&apply_all_defaults(UarwatchConfig::default()));
        assert_eq!(settings.logger.max_entries, 10_000);
        assert!(settings.logger.enabled);
        assert_eq!(settings.logger.details, DetailsLimits::default());
        assert!(settings.sink_endpoint.is_none());
        assert!(settings.api_origin.is_none());
        assert_eq!(settings.hooks.resize_debounce, Duration::from_millis(500));
        assert_eq!(settings.hooks.memory_interval, Duration::from_secs(60));
        assert_eq!(settings.drain_period(), Duration::from_millis(1100));
    }

    #[test]
    fn overrides_are_carried() {
        let cfg = UarwatchConfig {
            enabled: Some(false),
            log_dir: Some("/var/log/uarwatch".into()),
            client_context: Some(ClientContextConfig {
                user_agent: Some("dashboard/2.1".into()),
                url: Some("https://uar.example.com".into()),
            }),
            sink: Some(SinkConfig {
                endpoint: Some("https://collector.example.com/logs".into()),
                timeout_ms: Some(750),
            }),
            api: Some(ApiConfig {
                origin: Some("https://uar.example.com/api".into()),
            }),
            hooks: Some(HooksConfig {
                capture_panics: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let settings = Settings::from_config(&cfg);
        assert!(!settings.logger.enabled);
        assert_eq!(settings.log_dir, Some(PathBuf::from("/var/log/uarwatch")));
        assert_eq!(settings.logger.client_context.user_agent, "dashboard/2.1");
        assert_eq!(settings.sink_timeout, Duration::from_millis(750));
        assert!(settings.hooks.capture_panics);
        assert_eq!(settings.api_origin.as_deref(), Some("https://uar.example.com/api"));
    }
}
