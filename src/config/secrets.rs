//! Credentials read from the environment
//!
//! Secrets never live in the JSON config file. They are read from environment
//! variables (a `.env` file is loaded by the CLI before this runs):
//!
//! ```bash
//! export REASONER_API_KEY="..."
//! export ANALYTICS_USERNAME="analyst@example.com"   # overrides analytics.username
//! export ANALYTICS_PASSWORD="..."
//! export ODOS_WALLET_ADDRESS="0x..."                 # optional, quotes only
//! ```

use secrecy::SecretString;

/// Environment variable names
pub mod env_vars {
    pub const REASONER_API_KEY: &str = "REASONER_API_KEY";
    pub const ANALYTICS_USERNAME: &str = "ANALYTICS_USERNAME";
    pub const ANALYTICS_PASSWORD: &str = "ANALYTICS_PASSWORD";
    pub const ODOS_WALLET_ADDRESS: &str = "ODOS_WALLET_ADDRESS";
}

/// Address used for quotes when no wallet is configured
pub const ZERO_WALLET: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug)]
pub struct Secrets {
    pub reasoner_api_key: Option<SecretString>,
    pub analytics_username: Option<String>,
    pub analytics_password: Option<SecretString>,
    pub wallet_address: String,
}

impl Secrets {
    pub fn from_env() -> Self {
        let reasoner_api_key = non_empty_var(env_vars::REASONER_API_KEY).map(SecretString::from);
        if reasoner_api_key.is_none() {
            tracing::debug!("{} not set, reasoner requests are unauthenticated", env_vars::REASONER_API_KEY);
        }

        let analytics_password =
            non_empty_var(env_vars::ANALYTICS_PASSWORD).map(SecretString::from);
        if analytics_password.is_none() {
            tracing::warn!(
                "{} not set, live analytics queries will fail to authenticate",
                env_vars::ANALYTICS_PASSWORD
            );
        }

        let wallet_address = non_empty_var(env_vars::ODOS_WALLET_ADDRESS)
            .unwrap_or_else(|| ZERO_WALLET.to_string());

        Self {
            reasoner_api_key,
            analytics_username: non_empty_var(env_vars::ANALYTICS_USERNAME),
            analytics_password,
            wallet_address,
        }
    }

    /// Secrets for offline use (synthetic data, local calls)
    pub fn empty() -> Self {
        Self {
            reasoner_api_key: None,
            analytics_username: None,
            analytics_password: None,
            wallet_address: ZERO_WALLET.to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
