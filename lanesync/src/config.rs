use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Deserialize;
use anyhow::{Context, Result};
use shared::types::NodeDescriptor;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Seed node list, written to the state store only while it is empty
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Node to load from; the default node when absent
    #[serde(default)]
    pub load: Option<NodeDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    /// Active user; seeds the state store like `nodes`
    pub user: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/lanesync/state.db")
}

fn default_display_secs() -> u64 {
    5
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_secs: default_display_secs(),
        }
    }
}

impl NotificationConfig {
    pub fn display_for(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}
