//! Per-tier tool allow-lists.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Wildcard entry granting access to every tool.
pub const ALL_TOOLS: &str = "*";

/// Static tier -> tool allow-list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolAccessConfig {
    /// Tools available to the free tier (and anonymous callers)
    pub free: Vec<String>,
    /// Tools available to the premium tier
    pub premium: Vec<String>,
    /// Tools available to the pro tier
    pub pro: Vec<String>,
}

impl Default for ToolAccessConfig {
    fn default() -> Self {
        Self {
            free: vec![
                "get_company_info".to_string(),
                "search_companies".to_string(),
                "get_recent_filings".to_string(),
                "get_recent_insider_activity".to_string(),
                "get_largest_daily_transactions".to_string(),
                "get_largest_weekly_transactions".to_string(),
            ],
            premium: vec![ALL_TOOLS.to_string()],
            pro: vec![ALL_TOOLS.to_string()],
        }
    }
}

/// Feature gate: decides whether a tier may invoke a named tool.
pub struct FeatureGate {
    tools: HashMap<Tier, HashSet<String>>,
}

impl FeatureGate {
    /// Build the gate from configuration. Loaded once at startup,
    /// immutable for the process lifetime.
    pub fn new(config: &ToolAccessConfig) -> Self {
        let mut tools = HashMap::new();
        tools.insert(Tier::Free, config.free.iter().cloned().collect());
        tools.insert(Tier::Premium, config.premium.iter().cloned().collect());
        tools.insert(Tier::Pro, config.pro.iter().cloned().collect());
        Self { tools }
    }

    /// Whether `tier` may invoke `tool`.
    ///
    /// Matches the wildcard or the exact tool name, case-sensitively,
    /// with no normalization. A tier with no configured set denies.
    pub fn is_allowed(&self, tier: Tier, tool: &str) -> bool {
        match self.tools.get(&tier) {
            Some(set) => set.contains(ALL_TOOLS) || set.contains(tool),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_free_tier_excludes_history_tools() {
        let gate = FeatureGate::new(&ToolAccessConfig::default());
        assert!(gate.is_allowed(Tier::Free, "get_company_info"));
        assert!(!gate.is_allowed(Tier::Free, "get_company_filings"));
        assert!(!gate.is_allowed(Tier::Free, "get_insider_transactions"));
    }

    #[test]
    fn wildcard_grants_everything() {
        let gate = FeatureGate::new(&ToolAccessConfig::default());
        assert!(gate.is_allowed(Tier::Premium, "get_company_filings"));
        assert!(gate.is_allowed(Tier::Pro, "some_future_tool"));
    }

    #[test]
    fn match_is_case_sensitive_and_exact() {
        let config = ToolAccessConfig {
            free: vec!["get_company_info".to_string()],
            premium: vec![],
            pro: vec![],
        };
        let gate = FeatureGate::new(&config);
        assert!(gate.is_allowed(Tier::Free, "get_company_info"));
        assert!(!gate.is_allowed(Tier::Free, "GET_COMPANY_INFO"));
        assert!(!gate.is_allowed(Tier::Free, "get_company_info "));
    }

    #[test]
    fn empty_tool_set_denies_everything() {
        let config = ToolAccessConfig {
            free: vec![],
            premium: vec![],
            pro: vec![],
        };
        let gate = FeatureGate::new(&config);
        assert!(!gate.is_allowed(Tier::Premium, "get_company_info"));
    }
}
