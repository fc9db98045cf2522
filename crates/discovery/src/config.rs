use serde::Deserialize;
use std::time::Duration;

/// Base URL used by [`ClientConfig::from_env`] when nothing is set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Request timeout applied to the default reqwest transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_URL_ENV: &str = "ENS_DISCOVERY_API_URL";
const VERIFY_NODE_ENV: &str = "ENS_DISCOVERY_VERIFY_NODE";

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Registry root, e.g. `https://registry.example.com`. Validated when the
    /// client is built.
    pub api_base_url: String,
    /// Also require the resolved service's `ensNode` to match the locally
    /// computed namehash.
    pub verify_ens_node: bool,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            verify_ens_node: false,
        }
    }

    pub fn with_ens_node_verification(mut self, enabled: bool) -> Self {
        self.verify_ens_node = enabled;
        self
    }

    /// Read `ENS_DISCOVERY_API_URL` and `ENS_DISCOVERY_VERIFY_NODE`.
    pub fn from_env() -> Self {
        let api_base_url =
            std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let verify_ens_node = std::env::var(VERIFY_NODE_ENV)
            .map(|val| parse_flag(&val))
            .unwrap_or(false);
        Self {
            api_base_url,
            verify_ens_node,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
