//! `uarwatch-config`: configuration for the uarwatch audit pipeline.
//!
//! Provides:
//! - Typed schema (store bound, diagnostics, details ceiling, sink, API
//!   origin, hook timings)
//! - YAML read/write with atomic replace and backup rotation
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{
    ApiConfig, ClientContextConfig, DetailsConfig, HooksConfig, SinkConfig, UarwatchConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply defaults and validate a config file.
///
/// Warnings are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<UarwatchConfig> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// As `load_and_prepare`, resolving `${VAR}` against `env`.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<UarwatchConfig> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: UarwatchConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let summary: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid config {}: {}", path.display(), summary.join("; "));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn prepares_substituted_defaulted_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uarwatch.yaml");
        std::fs::write(
            &path,
            "maxEntries: 300\nsink:\n  endpoint: https://${COLLECTOR}/logs\n",
        )
        .unwrap();

        let cfg = load_and_prepare_with(&path, &env(&[("COLLECTOR", "audit.example.com")]))
            .await
            .unwrap();
        assert_eq!(cfg.max_entries, Some(300));
        let sink = cfg.sink.unwrap();
        assert_eq!(sink.endpoint.as_deref(), Some("https://audit.example.com/logs"));
        assert_eq!(sink.timeout_ms, Some(defaults::DEFAULT_SINK_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn invalid_config_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uarwatch.yaml");
        std::fs::write(&path, "maxEntries: 0\n").unwrap();
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("maxEntries"));
    }

    #[tokio::test]
    async fn missing_env_var_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uarwatch.yaml");
        std::fs::write(&path, "api:\n  origin: ${UAR_ORIGIN}\n").unwrap();
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("UAR_ORIGIN"));
    }

    #[tokio::test]
    async fn missing_file_prepares_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_and_prepare_with(&dir.path().join("none.yaml"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(cfg.max_entries, Some(defaults::DEFAULT_MAX_ENTRIES));
    }
}
