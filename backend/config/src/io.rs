//! Config file read/write with atomic replace and backup rotation.

use crate::schema::UarwatchConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "uarwatch.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 3;

/// Resolve the config directory.
/// Priority: `UARWATCH_CONFIG_DIR` env > `~/.uarwatch/` > `./.uarwatch`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("UARWATCH_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".uarwatch"),
        None => PathBuf::from(".uarwatch"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config. A missing file yields the empty config.
pub async fn load_config(path: &Path) -> Result<UarwatchConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(UarwatchConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(UarwatchConfig::default());
    }

    let config: UarwatchConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write config to disk atomically (temp file, then rename), keeping
/// rolling backups of the previous file.
pub async fn write_config(config: &UarwatchConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// uarwatch.yaml.bak.1 → .bak.2 → … → .bak.N; failures are only warned about.
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_default() {
        let dir = tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(cfg, UarwatchConfig::default());
    }

    #[tokio::test]
    async fn write_then_load() {
        let dir = tempdir().unwrap();
        let path = config_file_path(&dir.path().join("nested"));
        let cfg = UarwatchConfig {
            max_entries: Some(42),
            ..Default::default()
        };
        write_config(&cfg, &path).await.unwrap();
        assert_eq!(load_config(&path).await.unwrap(), cfg);
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn rewrite_keeps_backups() {
        let dir = tempdir().unwrap();
        let path = config_file_path(dir.path());
        for n in 1..=5 {
            let cfg = UarwatchConfig {
                max_entries: Some(n),
                ..Default::default()
            };
            write_config(&cfg, &path).await.unwrap();
        }
        assert_eq!(load_config(&path).await.unwrap().max_entries, Some(5));
        let bak1 = load_config(&path.with_extension("yaml.bak.1")).await.unwrap();
        assert_eq!(bak1.max_entries, Some(4));
        assert!(path.with_extension(format!("yaml.bak.{MAX_BACKUPS}")).exists());
        assert!(!path.with_extension(format!("yaml.bak.{}", MAX_BACKUPS + 1)).exists());
    }

    #[tokio::test]
    async fn malformed_yaml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "maxEntries: [not, a, number]").unwrap();
        let err = load_config(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
