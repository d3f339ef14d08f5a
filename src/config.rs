use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::AdjustmentParsing;

/// default API root of the back office
pub const DEFAULT_BASE_URL: &str = "https://companies-management-api.onrender.com/v1";

/// application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// remote gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

/// selection ledger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub adjustment_parsing: AdjustmentParsing,
}

/// month navigation window around the current month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_months_back")]
    pub months_back: u32,
    #[serde(default = "default_months_forward")]
    pub months_forward: u32,
}

fn default_months_back() -> u32 {
    12
}

fn default_months_forward() -> u32 {
    12
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            months_back: default_months_back(),
            months_forward: default_months_forward(),
        }
    }
}

impl AppConfig {
    /// load from an optional `honorarios.toml` and `HONORARIOS__*` variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("honorarios").required(false))
            .add_source(
                config::Environment::with_prefix("HONORARIOS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// load from an in-memory TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
