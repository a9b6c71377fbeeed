//! Configuration Management
//!
//! Handles persistent configuration storage for remoteview.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API base URL, e.g. `https://example.com/api/0`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default organization slug
    #[serde(default)]
    pub org: Option<String>,
    /// Default project slug
    #[serde(default)]
    pub project: Option<String>,
    /// Last viewed screen
    #[serde(default)]
    pub last_view: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("remoteview").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective base URL (env > config)
    pub fn effective_base_url(&self) -> Option<String> {
        std::env::var("REMOTEVIEW_BASE_URL")
            .ok()
            .or_else(|| self.base_url.clone())
    }

    /// Get effective organization (env > config)
    pub fn effective_org(&self) -> Option<String> {
        std::env::var("REMOTEVIEW_ORG")
            .ok()
            .or_else(|| self.org.clone())
    }

    /// Get effective project (env > config)
    pub fn effective_project(&self) -> Option<String> {
        std::env::var("REMOTEVIEW_PROJECT")
            .ok()
            .or_else(|| self.project.clone())
    }

    /// API token comes from the environment only; it is never persisted.
    pub fn effective_token() -> Option<String> {
        std::env::var("REMOTEVIEW_TOKEN").ok()
    }

    /// Set last viewed screen and save
    pub fn set_last_view(&mut self, view: &str) -> Result<()> {
        self.last_view = Some(view.to_string());
        self.save()
    }
}
