//! User configuration stored as `config.json` in the data directory.
//!
//! Everything here only supplies defaults for the command line: a custom
//! database path, the sports used when none are given, the smoothing window
//! of `series` and the row limit of `top` and `best`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitstat::libs::config::Config;
//!
//! let mut config = Config::read()?;
//! config.default_sports = vec!["Run".to_string()];
//! config.save()?;
//! # Ok::<(), fitstat::libs::error::StatsError>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::error::{Result, StatsError};
use crate::libs::messages::Message;
use crate::msg_print;
use dialoguer::{theme::ColorfulTheme, Input};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_SMOOTHING_WINDOW: usize = 7;
pub const DEFAULT_TOP_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store location; the data directory is used when unset.
    pub database: Option<PathBuf>,
    /// Sports applied when a command is given none.
    pub default_sports: Vec<String>,
    /// Days averaged by `series --smooth`.
    pub smoothing_window: usize,
    /// Rows returned by `top` and `best` without `--limit`.
    pub top_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            default_sports: Vec::new(),
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            top_limit: DEFAULT_TOP_LIMIT,
        }
    }
}

impl Config {
    /// Loads `config.json`, or the defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// [`StatsError::Config`] when the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(&config_file_path)
            .map_err(|e| StatsError::Config(format!("cannot read {}: {}", config_file_path.display(), e)))?;
        serde_json::from_str(&config_str)
            .map_err(|e| StatsError::Config(format!("cannot parse {}: {}", config_file_path.display(), e)))
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(&config_file_path)
            .map_err(|e| StatsError::Config(format!("cannot write {}: {}", config_file_path.display(), e)))?;
        serde_json::to_writer_pretty(&config_file, &self).map_err(|e| StatsError::Config(e.to_string()))?;
        Ok(())
    }

    /// Sports to filter on: `requested` when given, the configured defaults otherwise.
    pub fn sports_or_default(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            self.default_sports.clone()
        } else {
            requested.to_vec()
        }
    }

    /// Interactive setup, prefilled with the current values.
    pub fn init() -> Result<Self> {
        let current = Self::read().unwrap_or_default();
        let prompt = |e: dialoguer::Error| StatsError::Config(format!("prompt failed: {}", e));

        msg_print!(Message::ConfigWizard, true);
        let database: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptDatabasePath.to_string())
            .default(current.database.as_ref().map(|p| p.display().to_string()).unwrap_or_default())
            .allow_empty(true)
            .interact_text()
            .map_err(prompt)?;
        let sports: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptDefaultSports.to_string())
            .default(current.default_sports.join(","))
            .allow_empty(true)
            .interact_text()
            .map_err(prompt)?;
        let smoothing_window: usize = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSmoothingWindow.to_string())
            .default(current.smoothing_window)
            .interact_text()
            .map_err(prompt)?;
        let top_limit: u32 = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptTopLimit.to_string())
            .default(current.top_limit)
            .interact_text()
            .map_err(prompt)?;

        Ok(Self {
            database: (!database.trim().is_empty()).then(|| PathBuf::from(database.trim())),
            default_sports: parse_list(&sports),
            smoothing_window: smoothing_window.max(1),
            top_limit,
        })
    }
}

/// Splits a comma separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
