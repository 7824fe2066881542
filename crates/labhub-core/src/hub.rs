//! Hub environments and resource paths.

use serde::{Deserialize, Serialize};

/// Base URL of the hub's certification (testing) environment.
pub const TESTING_BASE_URL: &str = "https://certhubservices.quanum.com";

/// Base URL of the hub's production environment.
pub const PRODUCTION_BASE_URL: &str = "https://hubservices.quanum.com";

/// Which hub environment requests are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubMode {
    #[default]
    Test,
    Production,
}

impl HubMode {
    /// Maps the site-wide production flag onto a mode. Absent means test.
    pub fn from_production_flag(production: Option<bool>) -> Self {
        match production {
            Some(true) => Self::Production,
            _ => Self::Test,
        }
    }

    /// Picks the base URL for this mode out of the configured pair.
    pub fn select<'a>(&self, testing_url: &'a str, production_url: &'a str) -> &'a str {
        let url = match self {
            Self::Test => testing_url,
            Self::Production => production_url,
        };
        url.trim_end_matches('/')
    }
}

impl std::fmt::Display for HubMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Resource paths, relative to the selected base URL.
pub mod paths {
    pub const TOKEN: &str = "/hub-authorization-server/oauth2/token";
    pub const ORDER_DOCUMENT: &str = "/hub-resource-server/oauth2/order/document";
    pub const RESULTS: &str = "/hub-resource-server/oauth2/result/getResults";
    pub const RESOURCE_SERVER_PREFIX: &str = "/hub-resource-server";

    /// Compendium listing for a receiving facility.
    pub fn compendium_listing(receiver_id: &str) -> String {
        format!("{RESOURCE_SERVER_PREFIX}/oauth2/compendium/requestCompendiums/CDC?BU={receiver_id}")
    }
}
