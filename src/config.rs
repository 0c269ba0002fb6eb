//! # Client Configuration
//!
//! Configuration management for the task store client and sync engine.
//! Supports environment variables, config files, and in-code overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// Client configuration for store connections and sync behavior
///
/// # Examples
///
/// ```rust
/// use stagecheck_client::config::ClientConfig;
///
/// // Default configuration
/// let config = ClientConfig::default();
/// assert_eq!(config.store.base_url, "http://localhost:8080");
/// assert_eq!(config.sync.verify_retry_delay_ms, 1000);
/// ```
///
/// ```rust,no_run
/// use stagecheck_client::config::ClientConfig;
///
/// // Load configuration from environment and config files
/// let config = ClientConfig::load().expect("Failed to load config");
///
/// // Access task store settings
/// println!("Store URL: {}", config.store.base_url);
/// println!("Timeout: {}ms", config.store.timeout_ms);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Task store API configuration
    pub store: StoreConfig,
    /// Sync engine tuning
    pub sync: SyncConfig,
}

/// Task store endpoint configuration
///
/// # Examples
///
/// ```rust
/// use stagecheck_client::config::StoreConfig;
///
/// let config = StoreConfig {
///     base_url: "https://tasks.example.com".to_string(),
///     timeout_ms: 60000,
///     auth_token: Some("secret-token".to_string()),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL for the store API (e.g., "<http://localhost:8080>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// API authentication token (if required)
    pub auth_token: Option<String>,
}

/// Sync engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay before the scheduled re-verification fetch, in milliseconds
    pub verify_retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_ms: 30000,
                auth_token: None,
            },
            sync: SyncConfig {
                verify_retry_delay_ms: 1000,
            },
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and config file
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (~/.stagecheck/config.toml)
    /// 3. Default values
    pub fn load() -> SyncResult<Self> {
        let mut config = Self::default();

        // Try to load from config file
        if let Some(config_path) = Self::find_config_file() {
            debug!("Loading config from: {}", config_path.display());
            match Self::load_from_file(&config_path) {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    debug!("Failed to load config file: {}", e);
                    // Continue with defaults if config file fails
                }
            }
        }

        // Override with environment variables
        config.apply_env_overrides();

        debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::config_error(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| SyncError::config_error(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = [
            // Current directory
            Path::new("./stagecheck-client.toml"),
            Path::new("./config/stagecheck-client.toml"),
            // User home directory
            &dirs::home_dir()?.join(".stagecheck").join("config.toml"),
            &dirs::config_dir()?.join("stagecheck").join("client.toml"),
        ];

        for path in &possible_paths {
            if path.exists() && path.is_file() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Store API overrides
        if let Ok(url) = std::env::var("STAGECHECK_STORE_URL") {
            self.store.base_url = url;
        }
        if let Ok(timeout) = std::env::var("STAGECHECK_STORE_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.store.timeout_ms = timeout_ms;
            }
        }
        if let Ok(token) = std::env::var("STAGECHECK_STORE_AUTH_TOKEN") {
            self.store.auth_token = Some(token);
        }

        // Sync engine overrides
        if let Ok(delay) = std::env::var("STAGECHECK_VERIFY_RETRY_DELAY_MS") {
            if let Ok(delay_ms) = delay.parse() {
                self.sync.verify_retry_delay_ms = delay_ms;
            }
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::config_error(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SyncError::config_error(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SyncError::config_error(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get default config file path
    pub fn default_config_path() -> SyncResult<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| SyncError::config_error("Could not determine home directory"))?;

        Ok(home_dir.join(".stagecheck").join("config.toml"))
    }
}
