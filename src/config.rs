//! Configuration management
//!
//! TOML config file under the platform config directory, created with
//! defaults on first run. The bot token can also come from the
//! `MENTOR_BOT_TOKEN` environment variable, which wins over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::telegram::TelegramConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Backing document locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Long-polling settings
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Locations of the persisted documents, relative to the working
/// directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// User progress document (rewritten on every mutation)
    #[serde(default = "default_users_path")]
    pub users_path: PathBuf,
    /// Content catalog document (read once at startup)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Append-only feedback log
    #[serde(default = "default_feedback_path")]
    pub feedback_path: PathBuf,
}

fn default_users_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("feedback.txt")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_path: default_users_path(),
            catalog_path: default_catalog_path(),
            feedback_path: default_feedback_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// getUpdates long-poll timeout, seconds
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u32,
    /// Maximum updates fetched per poll
    #[serde(default = "default_poll_limit")]
    pub limit: u32,
}

fn default_poll_timeout() -> u32 {
    30
}

fn default_poll_limit() -> u32 {
    100
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            limit: default_poll_limit(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating a default one if missing.
    /// `MENTOR_BOT_TOKEN` overrides the stored bot token.
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&contents).context("Failed to parse config file")?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if let Ok(token) = std::env::var("MENTOR_BOT_TOKEN") {
            config.telegram.bot_token = token;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent().context("Config path has no parent")?;

        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "mentor-bot", "mentor-bot")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration (token masked)
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    let token = if config.telegram.bot_token.is_empty() {
        "(not set)".to_string()
    } else {
        let visible = config.telegram.bot_token.chars().take(6).collect::<String>();
        format!("{}…", visible)
    };

    println!("Configuration ({}):", config_path()?.display());
    println!("  bot token:      {}", token);
    println!("  bot username:   {}", config.telegram.bot_username);
    println!(
        "  welcome photo:  {}",
        config
            .telegram
            .welcome_photo
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("  users file:     {}", config.storage.users_path.display());
    println!("  catalog file:   {}", config.storage.catalog_path.display());
    println!("  feedback file:  {}", config.storage.feedback_path.display());
    println!("  poll timeout:   {}s", config.polling.timeout_secs);

    Ok(())
}

/// Store the bot token in the config file
pub fn set_token(token: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.telegram.bot_token = token.to_string();
    config.save()?;
    println!("Bot token stored.");
    Ok(())
}

/// Store the bot username used for referral links
pub fn set_username(username: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.telegram.bot_username = username.trim_start_matches('@').to_string();
    config.save()?;
    println!("Bot username set to {}", config.telegram.bot_username);
    Ok(())
}
