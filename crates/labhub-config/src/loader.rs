use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use crate::{AppConfig, ConfigError};

/// Default file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "labhub.toml";

pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();
    let file = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if file.exists() {
        debug!(path = %file.display(), "Loading configuration file");
        builder = builder.add_source(File::from(file));
    }
    // Environment variable overrides, e.g., LABHUB__HUB__CLIENT_ID=abc.
    // Values stay strings so secrets like "0012345" keep their leading zeros;
    // numeric fields are still converted during deserialization.
    builder = builder.add_source(
        Environment::with_prefix("LABHUB")
            .try_parsing(false)
            .separator("__"),
    );
    let cfg = builder
        .build()
        .map_err(|e| ConfigError::Build(e.to_string()))?;
    let merged: AppConfig = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
    merged.validate()?;
    Ok(merged)
}

pub fn load_config_with_default_path<P: AsRef<Path>>(
    path: Option<P>,
) -> Result<AppConfig, ConfigError> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_config(p.as_deref())
}
