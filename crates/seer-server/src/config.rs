//! Server configuration.

use serde::{Deserialize, Serialize};

use seer_access::quota::QuotaFailPolicy;
use seer_access::{LimitsConfig, ToolAccessConfig};

/// Which rate-limiter backend the server wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterBackendKind {
    /// Persistent dual-window counters in the shared store
    Shared,
    /// Process-local token buckets (no shared store required)
    Local,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Service identity reported on `/health` and `/mcp/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Human-readable description
    pub description: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "shareseer".to_string(),
            description: "SEC filings, insider transactions, and financial data".to_string(),
        }
    }
}

/// Full server configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ListenConfig,
    /// Service identity
    pub service: ServiceInfo,
    /// Per-tier request quotas
    pub rate_limiting: LimitsConfig,
    /// Per-tier tool allow-lists
    pub tiers: ToolAccessConfig,
    /// What to do when quota counters are unreadable
    pub quota_fail_policy: QuotaFailPolicyConfig,
    /// Rate-limiter backend selection
    pub limiter_backend: LimiterBackendKind,
}

/// Serde wrapper defaulting the fail policy to fail-open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaFailPolicyConfig(pub QuotaFailPolicy);

impl Default for QuotaFailPolicyConfig {
    fn default() -> Self {
        Self(QuotaFailPolicy::Open)
    }
}

impl Default for LimiterBackendKind {
    fn default() -> Self {
        LimiterBackendKind::Shared
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seer_access::Tier;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.limiter_backend, LimiterBackendKind::Shared);
        assert_eq!(config.quota_fail_policy.0, QuotaFailPolicy::Open);
        assert_eq!(config.rate_limiting.for_tier(Tier::Free).requests_per_hour, 10);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            limiter_backend = "local"
            quota_fail_policy = "closed"

            [server]
            port = 9090

            [rate_limiting.premium]
            requests_per_hour = 500
            requests_per_day = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.limiter_backend, LimiterBackendKind::Local);
        assert_eq!(config.quota_fail_policy.0, QuotaFailPolicy::Closed);
        assert_eq!(
            config.rate_limiting.for_tier(Tier::Premium).requests_per_hour,
            500
        );
        // Untouched tiers keep defaults.
        assert_eq!(config.rate_limiting.for_tier(Tier::Free).requests_per_day, 100);
    }
}
