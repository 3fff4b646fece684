//! Agent profiles and the registry that resolves them
//!
//! A profile bundles the behavior knobs a request selects with its
//! `agent` parameter: the system prompt handed to the reply stage, the
//! default synthesis voice, the generation budget and the daily quota
//! ceiling. Profiles are built once at startup and never mutated.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A named behavior profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Identifier callers select with the `agent` parameter
    #[serde(default = "default_id")]
    pub id: String,

    /// Human-readable name for logs and dashboards
    #[serde(default)]
    pub display_name: String,

    /// Instructions passed to the reply-generation stage
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Voice used when the request carries no override
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Generation budget for the reply stage
    #[serde(default = "default_max_reply_tokens")]
    pub max_reply_tokens: u32,

    /// Daily usage ceiling per user, in seconds
    #[serde(default = "default_daily_quota_seconds")]
    pub daily_quota_seconds: f64,
}

fn default_id() -> String {
    "general".to_string()
}
fn default_system_prompt() -> String {
    "You are a friendly voice assistant. Keep replies short and \
     conversational, two or three sentences at most, suitable for being \
     read aloud."
        .to_string()
}
fn default_voice() -> String {
    "alloy".to_string()
}
fn default_max_reply_tokens() -> u32 {
    256
}
fn default_daily_quota_seconds() -> f64 {
    600.0
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            id: default_id(),
            display_name: "General Assistant".to_string(),
            system_prompt: default_system_prompt(),
            default_voice: default_voice(),
            max_reply_tokens: default_max_reply_tokens(),
            daily_quota_seconds: default_daily_quota_seconds(),
        }
    }
}

/// Static lookup from agent id to profile
///
/// `resolve` is total: unknown ids fall back to the built-in "general"
/// profile rather than failing.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<AgentProfile>>,
    general: Arc<AgentProfile>,
}

impl AgentRegistry {
    /// Registry holding only the built-in profiles
    pub fn builtin() -> Self {
        Self::with_profiles(Vec::new())
    }

    /// Registry with the built-ins plus `profiles` merged over them
    pub fn with_profiles(profiles: Vec<AgentProfile>) -> Self {
        let mut agents: HashMap<String, Arc<AgentProfile>> = HashMap::new();
        for profile in Self::builtin_profiles() {
            agents.insert(profile.id.clone(), Arc::new(profile));
        }
        for profile in profiles {
            agents.insert(profile.id.clone(), Arc::new(profile));
        }

        // builtin_profiles always includes "general", so the fallback
        // lookup cannot miss
        let general = agents
            .get("general")
            .cloned()
            .unwrap_or_else(|| Arc::new(AgentProfile::default()));

        Self { agents, general }
    }

    fn builtin_profiles() -> Vec<AgentProfile> {
        vec![
            AgentProfile::default(),
            AgentProfile {
                id: "specialist".to_string(),
                display_name: "Product Specialist".to_string(),
                system_prompt: "You are a knowledgeable product specialist. \
                    Give precise, factual answers about products, pricing \
                    and availability. Keep replies brief enough to be read \
                    aloud and ask one clarifying question at a time."
                    .to_string(),
                default_voice: "sage".to_string(),
                max_reply_tokens: 384,
                daily_quota_seconds: 900.0,
            },
        ]
    }

    /// Resolve an agent id, falling back to "general" for unknown ids
    pub fn resolve(&self, agent_id: &str) -> Arc<AgentProfile> {
        match self.agents.get(agent_id) {
            Some(profile) => profile.clone(),
            None => {
                tracing::debug!(agent_id, "unknown agent id, using general profile");
                self.general.clone()
            }
        }
    }

    /// All registered profiles, sorted by id
    pub fn known_agents(&self) -> Vec<Arc<AgentProfile>> {
        let mut profiles: Vec<_> = self.agents.values().cloned().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    /// Per-agent daily ceilings, for seeding the quota store
    pub fn quota_ceilings(&self) -> HashMap<String, f64> {
        self.agents
            .iter()
            .map(|(id, profile)| (id.clone(), profile.daily_quota_seconds))
            .collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.resolve("general").daily_quota_seconds, 600.0);
        assert_eq!(registry.resolve("specialist").daily_quota_seconds, 900.0);
        assert_eq!(registry.resolve("specialist").default_voice, "sage");
    }

    #[test]
    fn test_unknown_id_falls_back_to_general() {
        let registry = AgentRegistry::builtin();
        let profile = registry.resolve("does-not-exist");
        assert_eq!(profile.id, "general");
        assert_eq!(profile.default_voice, "alloy");
        assert_eq!(profile.max_reply_tokens, 256);
    }

    #[test]
    fn test_profiles_merge_over_builtins() {
        let registry = AgentRegistry::with_profiles(vec![
            AgentProfile {
                id: "concierge".to_string(),
                daily_quota_seconds: 1200.0,
                ..AgentProfile::default()
            },
            AgentProfile {
                id: "general".to_string(),
                max_reply_tokens: 128,
                ..AgentProfile::default()
            },
        ]);

        assert_eq!(registry.resolve("concierge").daily_quota_seconds, 1200.0);
        // overridden general is also the fallback
        assert_eq!(registry.resolve("general").max_reply_tokens, 128);
        assert_eq!(registry.resolve("nope").max_reply_tokens, 128);
    }

    #[test]
    fn test_known_agents_sorted() {
        let registry = AgentRegistry::builtin();
        let ids: Vec<_> = registry
            .known_agents()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        assert_eq!(ids, vec!["general", "specialist"]);
    }

    #[test]
    fn test_quota_ceilings() {
        let ceilings = AgentRegistry::builtin().quota_ceilings();
        assert_eq!(ceilings.get("specialist"), Some(&900.0));
        assert_eq!(ceilings.get("general"), Some(&600.0));
    }
}
