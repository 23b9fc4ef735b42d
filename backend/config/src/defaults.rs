//! Config defaults: fills every unset field with its concrete value.

use crate::schema::{
    ApiConfig, ClientContextConfig, DetailsConfig, HooksConfig, SinkConfig, UarwatchConfig,
};

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_DETAILS_MAX_DEPTH: usize = 8;
pub const DEFAULT_DETAILS_MAX_BYTES: usize = 16 * 1024;
pub const DEFAULT_SINK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_INPUT_DEBOUNCE_MS: u64 = 1_000;
pub const DEFAULT_MEMORY_INTERVAL_SECS: u64 = 60;

/// Apply all defaults to a freshly loaded config. User-set values win.
pub fn apply_all_defaults(config: UarwatchConfig) -> UarwatchConfig {
    let config = apply_core_defaults(config);
    let config = apply_details_defaults(config);
    let config = apply_sink_defaults(config);
    apply_hook_defaults(config)
}

fn apply_core_defaults(mut config: UarwatchConfig) -> UarwatchConfig {
    config.enabled.get_or_insert(true);
    config.max_entries.get_or_insert(DEFAULT_MAX_ENTRIES);
    config
        .log_level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config.mirror_to_tracing.get_or_insert(false);
    config
        .client_context
        .get_or_insert_with(ClientContextConfig::default);
    config.api.get_or_insert_with(ApiConfig::default);
    config
}

fn apply_details_defaults(mut config: UarwatchConfig) -> UarwatchConfig {
    let details = config.details.get_or_insert_with(DetailsConfig::default);
    details.max_depth.get_or_insert(DEFAULT_DETAILS_MAX_DEPTH);
    details.max_bytes.get_or_insert(DEFAULT_DETAILS_MAX_BYTES);
    config
}

/// The endpoint stays unset: no endpoint means no forwarding.
fn apply_sink_defaults(mut config: UarwatchConfig) -> UarwatchConfig {
    let sink = config.sink.get_or_insert_with(SinkConfig::default);
    sink.timeout_ms.get_or_insert(DEFAULT_SINK_TIMEOUT_MS);
    config
}

fn apply_hook_defaults(mut config: UarwatchConfig) -> UarwatchConfig {
    let hooks = config.hooks.get_or_insert_with(HooksConfig::default);
    hooks.resize_debounce_ms.get_or_insert(DEFAULT_RESIZE_DEBOUNCE_MS);
    hooks.input_debounce_ms.get_or_insert(DEFAULT_INPUT_DEBOUNCE_MS);
    hooks
        .memory_interval_secs
        .get_or_insert(DEFAULT_MEMORY_INTERVAL_SECS);
    hooks.capture_panics.get_or_insert(false);
    config
}
