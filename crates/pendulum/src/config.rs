use std::path::Path;

use serde::{Deserialize, Serialize};

/// Server configuration loaded from an optional TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum request body accepted by the store endpoint (in bytes)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// Directory names left out of listings
    #[serde(default = "default_hidden_dirs")]
    pub hidden_dirs: Vec<String>,
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

fn default_hidden_dirs() -> Vec<String> {
    vec![".git".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_size: default_max_upload_size(),
            hidden_dirs: default_hidden_dirs(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Check if a directory should be hidden
    pub fn is_hidden_dir(&self, name: &str) -> bool {
        self.hidden_dirs.iter().any(|d| d == name)
    }
}
