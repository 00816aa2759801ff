//! Configuration for the trading intent agent

pub mod secrets;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub use secrets::Secrets;

/// Supported blockchain networks for swap quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
            Network::Base => 8453,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Base => "base",
        }
    }

    pub fn parse(s: &str) -> Option<Network> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "mainnet" | "eth" => Some(Network::Ethereum),
            "arbitrum" => Some(Network::Arbitrum),
            "optimism" => Some(Network::Optimism),
            "base" => Some(Network::Base),
            _ => None,
        }
    }
}

/// Remote reasoning service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Endpoint receiving `{messages, project, functions}` requests
    pub endpoint: String,
    /// Routing context used when the caller does not supply one
    pub default_project: String,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/resolve".to_string(),
            default_project: "trading".to_string(),
        }
    }
}

/// Analytics (BI tool) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Base URL of the Metabase-compatible analytics server
    pub base_url: String,
    /// Database the native queries run against
    pub database_id: u64,
    /// Principal used to authenticate (overridden by ANALYTICS_USERNAME)
    pub username: String,
    /// Serve every query from deterministic synthetic data
    pub synthetic: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            database_id: 1,
            username: "analyst".to_string(),
            synthetic: false,
        }
    }
}

/// DEX aggregator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    /// Network used when a quote request does not name one
    pub default_network: Network,
    /// Slippage tolerance used when a quote request does not name one (percent)
    pub default_slippage_percent: f64,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            default_network: Network::Ethereum,
            default_slippage_percent: 0.5,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reasoner: ReasonerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub dex: DexConfig,
    /// Path to audit log file (JSONL)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

impl Config {
    /// Load from a JSON file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.reasoner_url()?;
        self.analytics_url()?;
        if !(0.0..=50.0).contains(&self.dex.default_slippage_percent) {
            return Err(Error::Config(format!(
                "dex.default_slippage_percent must be within 0..=50, got {}",
                self.dex.default_slippage_percent
            )));
        }
        Ok(())
    }

    pub fn reasoner_url(&self) -> Result<Url> {
        Url::parse(&self.reasoner.endpoint)
            .map_err(|e| Error::Config(format!("Invalid reasoner.endpoint: {}", e)))
    }

    pub fn analytics_url(&self) -> Result<Url> {
        Url::parse(&self.analytics.base_url)
            .map_err(|e| Error::Config(format!("Invalid analytics.base_url: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_network() {
        assert_eq!(Network::parse("ethereum"), Some(Network::Ethereum));
        assert_eq!(Network::parse("Mainnet"), Some(Network::Ethereum));
        assert_eq!(Network::parse("arbitrum"), Some(Network::Arbitrum));
        assert_eq!(Network::parse("base"), Some(Network::Base));
        assert_eq!(Network::parse("solana"), None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let value = serde_json::json!({
            "analytics": {
                "base_url": "https://bi.example.com",
                "database_id": 4,
                "username": "ops"
            }
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.analytics.database_id, 4);
        assert!(!parsed.analytics.synthetic);
        assert_eq!(parsed.reasoner.default_project, "trading");
        assert_eq!(parsed.dex.default_network, Network::Ethereum);
        assert!(parsed.audit_log_path.is_none());
    }

    #[test]
    fn test_partial_sections_use_field_defaults() {
        let value = serde_json::json!({
            "reasoner": {"default_project": "research"},
            "analytics": {"synthetic": true},
            "dex": {"default_network": "base"}
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.dex.default_network, Network::Base);
        assert_eq!(parsed.dex.default_slippage_percent, 0.5);
        assert_eq!(parsed.reasoner.default_project, "research");
        assert_eq!(parsed.reasoner.endpoint, ReasonerConfig::default().endpoint);
        assert_eq!(parsed.analytics.database_id, 1);
        assert!(parsed.analytics.synthetic);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dex": {{"default_network": "base", "default_slippage_percent": 1.0}}}}"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).expect("load config");
        assert_eq!(config.dex.default_network, Network::Base);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = Config::default();
        config.analytics.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_slippage_out_of_range_rejected() {
        let mut config = Config::default();
        config.dex.default_slippage_percent = 75.0;
        assert!(config.validate().is_err());
    }
}
