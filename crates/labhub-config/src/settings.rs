use std::path::PathBuf;
use std::time::Duration;

use labhub_core::HubMode;
use labhub_core::hub::{PRODUCTION_BASE_URL, TESTING_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub site: SiteOptions,
    #[serde(default)]
    pub hub: HubSettings,
    #[serde(default)]
    pub requisition: RequisitionSettings,
    #[serde(default)]
    pub compendium: CompendiumSettings,
    #[serde(default)]
    pub results: ResultsSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.testing_url.trim().is_empty() || self.hub.production_url.trim().is_empty() {
            return Err(ConfigError::validation(
                "hub.testing_url and hub.production_url must not be empty",
            ));
        }
        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::validation("hub.timeout_secs must be > 0"));
        }
        if self.requisition.max_attempts == 0 {
            return Err(ConfigError::validation(
                "requisition.max_attempts must be > 0",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        if let Some(ref pg) = self.storage.postgres {
            if pg.url.trim().is_empty() {
                return Err(ConfigError::validation(
                    "storage.postgres.url must not be empty",
                ));
            }
            if pg.pool_size == 0 {
                return Err(ConfigError::validation(
                    "storage.postgres.pool_size must be > 0",
                ));
            }
        }
        Ok(())
    }

    /// Hub environment selected by the site production flag.
    pub fn hub_mode(&self) -> HubMode {
        HubMode::from_production_flag(Some(self.site.production_mode))
    }
}

/// Site-wide switches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SiteOptions {
    #[serde(default)]
    pub production_mode: bool,
    #[serde(default = "default_true")]
    pub download_requisition: bool,
    #[serde(default = "default_true")]
    pub drive_encryption: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            production_mode: false,
            download_requisition: true,
            drive_encryption: true,
        }
    }
}

/// Hub credentials and endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct HubSettings {
    #[serde(default)]
    pub client_id: Option<String>,
    /// Prefer LABHUB__HUB__CLIENT_SECRET over writing this into the file
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Receiving facility id used for compendium requests and file names
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default = "default_testing_url")]
    pub testing_url: String,
    #[serde(default = "default_production_url")]
    pub production_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_testing_url() -> String {
    TESTING_BASE_URL.into()
}
fn default_production_url() -> String {
    PRODUCTION_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            receiver_id: None,
            testing_url: default_testing_url(),
            production_url: default_production_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HubSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for HubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("receiver_id", &self.receiver_id)
            .field("testing_url", &self.testing_url)
            .field("production_url", &self.production_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Requisition storage and retry schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequisitionSettings {
    #[serde(default = "default_requisition_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub base_delay_ms: u64,
    /// Wait before the first attempt; the hub needs time after an order lands
    #[serde(default = "default_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_requisition_dir() -> PathBuf {
    PathBuf::from("documents/labs")
}
fn default_max_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    2000
}

impl Default for RequisitionSettings {
    fn default() -> Self {
        Self {
            directory: default_requisition_dir(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_delay_ms(),
            initial_delay_ms: default_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompendiumSettings {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Procedure provider id the imported rows are attributed to
    #[serde(default = "default_lab_id")]
    pub lab_id: i64,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("documents/temp")
}
fn default_lab_id() -> i64 {
    1
}

impl Default for CompendiumSettings {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            lab_id: default_lab_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSettings {
    /// Prefix of the key names looked up for each envelope version
    #[serde(default = "default_key_name")]
    pub key_name: String,
}

fn default_key_name() -> String {
    "labhub_result".into()
}

impl Default for ResultsSettings {
    fn default() -> Self {
        Self {
            key_name: default_key_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    #[serde(default)]
    pub postgres: Option<PostgresSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresSettings {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_pool_size() -> u32 {
    5
}
fn default_connect_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
