//! # Configuration Management Module
//!
//! Questforge reads a single TOML file (default `config.toml`). Every section
//! has defaults, so a partial file is valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use questforge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Data dir: {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data/questforge"
//!
//! [logging]
//! level = "info"
//! file = "questforge.log"
//!
//! [combat]
//! counter_delay_ms = 800
//! log_capacity = 10
//!
//! [progression]
//! cascade_level_ups = false
//!
//! [seeds]
//! monsters = "data/seeds/monsters.json"
//! skills = "data/seeds/skills.json"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::game::reward::LevelingPolicy;
use crate::game::service::GameSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub seeds: SeedsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data/questforge".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("questforge.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Pause before the monster's counter-attack, in milliseconds
    #[serde(default = "default_counter_delay_ms")]
    pub counter_delay_ms: u64,
    /// Combat log lines kept per encounter
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_counter_delay_ms() -> u64 {
    800
}

fn default_log_capacity() -> usize {
    10
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            counter_delay_ms: default_counter_delay_ms(),
            log_capacity: default_log_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Grant every level a large reward crosses instead of at most one
    #[serde(default)]
    pub cascade_level_ups: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedsConfig {
    pub monsters: String,
    pub skills: String,
}

impl Default for SeedsConfig {
    fn default() -> Self {
        Self {
            monsters: "data/seeds/monsters.json".to_string(),
            skills: "data/seeds/skills.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir cannot be empty"));
        }
        if self.combat.log_capacity == 0 {
            return Err(anyhow!("combat.log_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn leveling_policy(&self) -> LevelingPolicy {
        if self.progression.cascade_level_ups {
            LevelingPolicy::Cascading
        } else {
            LevelingPolicy::SingleStep
        }
    }

    /// Service tunables derived from the combat and progression sections.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            leveling: self.leveling_policy(),
            log_capacity: self.combat.log_capacity,
            counter_delay: Duration::from_millis(self.combat.counter_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_game_defaults() {
        let config = Config::default();
        assert_eq!(config.game_settings(), GameSettings::default());
        assert_eq!(config.leveling_policy(), LevelingPolicy::SingleStep);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [progression]
            cascade_level_ups = true

            [combat]
            counter_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.leveling_policy(), LevelingPolicy::Cascading);
        assert_eq!(config.combat.log_capacity, 10);
        assert_eq!(config.game_settings().counter_delay, Duration::ZERO);
        assert_eq!(config.storage.data_dir, "./data/questforge");
    }

    #[test]
    fn test_zero_log_capacity_rejected() {
        let mut config = Config::default();
        config.combat.log_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_default_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.seeds.monsters, "data/seeds/monsters.json");
        assert_eq!(loaded.logging.level, "info");
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let err = Config::load("/nonexistent/questforge.toml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
