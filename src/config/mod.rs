/// Configuration management
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub server: Option<ServerConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// The remembered media server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server base URL (e.g. http://192.168.1.100:32400)
    pub url: String,
    /// Friendly name, if known
    pub name: Option<String>,
}

/// Access-token storage, kept out of the main config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenStorage {
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                log_level: "info".to_string(),
            },
            server: None,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content).context("failed to parse config file")
        } else {
            fs::create_dir_all(&config_dir).context("failed to create config directory")?;
            let config = Self::default();
            let content = toml::to_string_pretty(&config)?;
            fs::write(&config_path, content)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        let config_path = config_dir.join("config.toml");
        fs::create_dir_all(&config_dir).context("failed to create config directory")?;
        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        Ok(())
    }

    /// Get configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("unable to determine config directory")?
            .join("plexling");
        Ok(dir)
    }

    /// Get cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .context("unable to determine cache directory")?
            .join("plexling");
        Ok(dir)
    }

    /// Load the stored access token
    pub fn load_token() -> Result<TokenStorage> {
        let token_path = Self::config_dir()?.join("token.json");

        if token_path.exists() {
            let content = fs::read_to_string(&token_path)
                .with_context(|| format!("failed to read {}", token_path.display()))?;
            serde_json::from_str(&content).context("failed to parse token file")
        } else {
            Ok(TokenStorage::default())
        }
    }

    /// Save the access token, readable only by the owning user
    pub fn save_token(tokens: &TokenStorage) -> Result<()> {
        let config_dir = Self::config_dir()?;
        let token_path = config_dir.join("token.json");
        fs::create_dir_all(&config_dir).context("failed to create config directory")?;

        let content = serde_json::to_string_pretty(tokens)?;
        fs::write(&token_path, content)
            .with_context(|| format!("failed to write {}", token_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&token_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&token_path, perms)?;
        }

        Ok(())
    }

    /// Clear the stored access token
    pub fn clear_token() -> Result<()> {
        let token_path = Self::config_dir()?.join("token.json");

        if token_path.exists() {
            fs::remove_file(&token_path)
                .with_context(|| format!("failed to remove {}", token_path.display()))?;
        }

        Ok(())
    }
}
