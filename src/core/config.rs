use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use super::error::{KeyCopError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub base_url: String,
    /// Minimum delay between any two requests against the platform API.
    pub rate_limit_delay_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: "https://api.github.com".to_string(),
            rate_limit_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Full discovery log, every record regardless of status.
    pub leaked_keys: String,
    /// Denormalized view of records that reached VALID_ACTIVE.
    pub valid_keys: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            leaked_keys: "data/leaked_keys.json".to_string(),
            valid_keys: "data/valid_keys.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results requested per search page (platform maximum is 100).
    pub per_page: usize,
    /// The platform serves at most this many results per query.
    pub max_results: usize,
    /// Cooldown after a rate-limit signal before retrying the same page.
    pub cooldown_secs: u64,
    /// Pause between successive pages to stay inside the search-rate budget.
    pub page_delay_secs: u64,
    /// Consecutive rate-limit signals tolerated for one page before the run
    /// is aborted instead of retrying forever.
    pub max_rate_limit_retries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_results: 1000,
            cooldown_secs: 60,
            page_delay_secs: 6,
            max_rate_limit_retries: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Pause between verification probes.
    pub probe_delay_ms: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            probe_delay_ms: 2000,
        }
    }
}

impl Config {
    /// Load configuration from the first TOML file that parses, falling back
    /// to defaults when none is present.
    pub fn load() -> Result<Self> {
        let config_paths = ["config/default.toml", "keycop.toml"];

        for path in config_paths {
            if !Path::new(path).exists() {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path);
                        return Ok(config);
                    }
                    Err(e) => warn!("Failed to parse config from {}: {}", path, e),
                },
                Err(e) => warn!("Failed to read config from {}: {}", path, e),
            }
        }

        Ok(Config::default())
    }

    /// Resolve the platform access token. Environment variables win over the
    /// config file; a missing token is a configuration error, surfaced before
    /// any run starts.
    pub fn github_token(&self) -> Result<String> {
        std::env::var("GITHUB_API_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok()
            .or_else(|| self.github.token.clone())
            .ok_or_else(|| {
                KeyCopError::Config(
                    "GitHub API token not found. Set GITHUB_API_TOKEN or add it to config/default.toml"
                        .to_string(),
                )
            })
    }
}
