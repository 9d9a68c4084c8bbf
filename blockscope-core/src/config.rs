use crate::error::{EngineError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine tuning. Every field has a default so a partial TOML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub heuristic: HeuristicPolicy,
    /// Characters of trimmed text compared when an index match needs confirming.
    pub text_match_chars: usize,
    /// Width and height given to normalized icon SVGs.
    pub icon_size: u32,
    pub probe_timeout_ms: u64,
    pub fetch_timeout_secs: u64,
    pub mutation_debounce_ms: u64,
}

/// Which SSR class names may be inferred as block names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicPolicy {
    pub name_pattern: String,
    pub min_length: usize,
    pub reserved_names: Vec<String>,
    pub reserved_prefixes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heuristic: HeuristicPolicy::default(),
            text_match_chars: 50,
            icon_size: 24,
            probe_timeout_ms: 500,
            fetch_timeout_secs: 10,
            mutation_debounce_ms: 500,
        }
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self {
            name_pattern: r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$".to_string(),
            min_length: 2,
            reserved_names: vec![
                "block".to_string(),
                "contained".to_string(),
                "icon".to_string(),
            ],
            reserved_prefixes: vec!["section-".to_string(), "icon-".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.heuristic.compile()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }
}

impl HeuristicPolicy {
    pub fn compile(&self) -> Result<CompiledHeuristic<'_>> {
        let pattern = Regex::new(&self.name_pattern)
            .map_err(|e| EngineError::Config(format!("heuristic.name_pattern: {}", e)))?;
        Ok(CompiledHeuristic {
            policy: self,
            pattern,
        })
    }
}

pub struct CompiledHeuristic<'a> {
    policy: &'a HeuristicPolicy,
    pattern: Regex,
}

impl CompiledHeuristic<'_> {
    pub fn accepts(&self, class: &str) -> bool {
        class.len() >= self.policy.min_length
            && !self.policy.reserved_names.iter().any(|n| n == class)
            && !self
                .policy
                .reserved_prefixes
                .iter()
                .any(|p| class.starts_with(p.as_str()))
            && self.pattern.is_match(class)
    }
}
