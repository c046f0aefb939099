use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/tasks";
pub const DEFAULT_STRATEGY: &str = "smart_balance";
const CONFIG_FILE: &str = "taskrank.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote prioritization service settings.
///
/// The two feature flags select between the behavior sets of the two
/// front ends this client replaces: one forwards the strategy on suggest and
/// offers clear actions, the other does neither.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub supports_suggest_strategy: bool,
    #[serde(default = "default_true")]
    pub supports_clear_actions: bool,
    #[serde(default = "default_strategy")]
    pub default_strategy: String,
    /// Choices offered by the terminal strategy selectors.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    /// Unset means requests never time out.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_strategy() -> String {
    DEFAULT_STRATEGY.to_string()
}

fn default_strategies() -> Vec<String> {
    ["smart_balance", "fastest_wins", "high_impact", "deadline_driven"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            supports_suggest_strategy: true,
            supports_clear_actions: true,
            default_strategy: default_strategy(),
            strategies: default_strategies(),
            request_timeout_secs: None,
        }
    }
}

impl ServiceConfig {
    /// Selector choices, with the default strategy guaranteed to be present.
    pub fn strategy_choices(&self) -> Vec<String> {
        let mut choices = self.strategies.clone();
        if !choices.iter().any(|s| s == &self.default_strategy) {
            choices.insert(0, self.default_strategy.clone());
        }
        choices
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub directory: Option<String>,
    pub retention_days: Option<u64>,
}

impl Config {
    /// Load the first config file found, or defaults when none exists.
    /// An explicit path must exist.
    pub fn load_with_path(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::load_file(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let mut candidates = Vec::new();

        if let Ok(explicit) = std::env::var("TASKRANK_CONFIG") {
            candidates.push(PathBuf::from(explicit));
        }

        candidates.push(PathBuf::from(CONFIG_FILE));

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("taskrank").join(CONFIG_FILE));
        }

        candidates.push(crate::paths::config_dir().join(CONFIG_FILE));

        for path in candidates {
            if path.exists() {
                let config = Self::load_file(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Config::default(), None))
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(self.service.base_url.trim()).with_context(|| {
            format!("Service base_url is not a valid URL: {}", self.service.base_url)
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!(
                "Service base_url must start with http:// or https://, got: {}",
                self.service.base_url
            );
        }
        // Endpoint paths and the strategy query are appended to the base.
        if base.query().is_some() || base.fragment().is_some() {
            anyhow::bail!(
                "Service base_url must not carry a query or fragment, got: {}",
                self.service.base_url
            );
        }
        if self.service.default_strategy.trim().is_empty() {
            anyhow::bail!("Service default_strategy cannot be empty");
        }
        if self.service.strategies.is_empty() {
            anyhow::bail!("At least one strategy must be configured");
        }
        if self.service.request_timeout_secs == Some(0) {
            anyhow::bail!("Service request_timeout_secs must be greater than 0");
        }
        Ok(())
    }
}
