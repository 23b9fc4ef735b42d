//! `uarwatch init-config`: write a config populated with every default.

use std::path::PathBuf;

use anyhow::{bail, Result};
use uarwatch_config::{apply_all_defaults, config_dir, config_file_path, write_config, UarwatchConfig};

pub async fn run(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| config_file_path(&config_dir()));
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    let config = apply_all_defaults(UarwatchConfig::default());
    write_config(&config, &path).await?;
    Ok(path)
}
