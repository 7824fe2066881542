//! Configuration for the lab hub integration.
//!
//! Settings are read from an optional TOML file and overridden by
//! `LABHUB__SECTION__KEY` environment variables. The `[site]` section carries
//! the site-wide switches that were historically global flags in the host
//! platform; they are passed explicitly to the components that need them.

pub mod loader;
pub mod settings;

pub use loader::{load_config, load_config_with_default_path};
pub use settings::{
    AppConfig, CompendiumSettings, HubSettings, LoggingSettings, PostgresSettings,
    RequisitionSettings, ResultsSettings, SiteOptions, StorageSettings,
};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config build error: {0}")]
    Build(String),

    #[error("Config deserialize error: {0}")]
    Deserialize(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
