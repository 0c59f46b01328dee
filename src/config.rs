//! Runtime configuration parsed from environment variables.
//!
//! All variables are optional; `main` loads `.env` first via `dotenvy`.
//! Malformed numbers fall back to their defaults. Values that parse but make
//! no sense (a zero tick, a default duration over the limit) are errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::directory::{DirectoryError, UserDirectory};
use crate::engine::SchedulerConfig;
use crate::gateway::InputLimits;
use crate::input::{ConsoleLayout, LayoutError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CONSOLE: &str = "snes";
pub const DEFAULT_TICK_MS: u64 = 10;
pub const DEFAULT_MAX_RUNNING_SEQUENCES: usize = 0;
pub const DEFAULT_INPUT_DURATION_MS: u32 = 200;
pub const DEFAULT_MAX_INPUT_DURATION_MS: u64 = 60_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TICK_MS must be greater than zero")]
    ZeroTick,
    #[error("DEFAULT_INPUT_DURATION_MS must be greater than zero")]
    ZeroDefaultDuration,
    #[error("DEFAULT_INPUT_DURATION_MS ({default_ms}) exceeds MAX_INPUT_DURATION_MS ({max_ms})")]
    DefaultOverMax { default_ms: u32, max_ms: u64 },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub console: String,
    pub console_layout_path: Option<PathBuf>,
    pub user_directory_path: Option<PathBuf>,
    pub tick_ms: u64,
    /// 0 means no cap.
    pub max_running_sequences: usize,
    pub default_input_duration_ms: u32,
    /// 0 means no limit.
    pub max_input_duration_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            console: DEFAULT_CONSOLE.to_owned(),
            console_layout_path: None,
            user_directory_path: None,
            tick_ms: DEFAULT_TICK_MS,
            max_running_sequences: DEFAULT_MAX_RUNNING_SEQUENCES,
            default_input_duration_ms: DEFAULT_INPUT_DURATION_MS,
            max_input_duration_ms: DEFAULT_MAX_INPUT_DURATION_MS,
        }
    }
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `CONSOLE`: `snes` (default) or `n64`
    /// - `CONSOLE_LAYOUT_PATH`: JSON layout file, overrides `CONSOLE`
    /// - `USER_DIRECTORY_PATH`: JSON user directory; everyone may send inputs when absent
    /// - `TICK_MS`: default 10
    /// - `MAX_RUNNING_SEQUENCES`: default 0 (no cap)
    /// - `DEFAULT_INPUT_DURATION_MS`: default 200
    /// - `MAX_INPUT_DURATION_MS`: default 60000 (0 disables the limit)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the values are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            port: env_parse("PORT", DEFAULT_PORT),
            console: std::env::var("CONSOLE").unwrap_or_else(|_| DEFAULT_CONSOLE.to_owned()),
            console_layout_path: env_path("CONSOLE_LAYOUT_PATH"),
            user_directory_path: env_path("USER_DIRECTORY_PATH"),
            tick_ms: env_parse("TICK_MS", DEFAULT_TICK_MS),
            max_running_sequences: env_parse("MAX_RUNNING_SEQUENCES", DEFAULT_MAX_RUNNING_SEQUENCES),
            default_input_duration_ms: env_parse("DEFAULT_INPUT_DURATION_MS", DEFAULT_INPUT_DURATION_MS),
            max_input_duration_ms: env_parse("MAX_INPUT_DURATION_MS", DEFAULT_MAX_INPUT_DURATION_MS),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero tick, a zero default duration, or a
    /// default duration longer than the macro limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.default_input_duration_ms == 0 {
            return Err(ConfigError::ZeroDefaultDuration);
        }
        if let Some(max_ms) = self.max_total_ms() {
            if u64::from(self.default_input_duration_ms) > max_ms {
                return Err(ConfigError::DefaultOverMax { default_ms: self.default_input_duration_ms, max_ms });
            }
        }
        Ok(())
    }

    fn max_total_ms(&self) -> Option<u64> {
        (self.max_input_duration_ms > 0).then_some(self.max_input_duration_ms)
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_period: Duration::from_millis(self.tick_ms),
            max_running: (self.max_running_sequences > 0).then_some(self.max_running_sequences),
        }
    }

    #[must_use]
    pub fn input_limits(&self) -> InputLimits {
        InputLimits { default_duration_ms: self.default_input_duration_ms, max_total_ms: self.max_total_ms() }
    }

    /// The layout file if one is configured, otherwise the named preset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Layout`] if the file or preset is invalid.
    pub fn load_layout(&self) -> Result<ConsoleLayout, ConfigError> {
        let layout = match &self.console_layout_path {
            Some(path) => ConsoleLayout::load(path)?,
            None => ConsoleLayout::preset(&self.console)?,
        };
        Ok(layout)
    }

    /// The directory file if one is configured, otherwise an open directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Directory`] if the file cannot be loaded.
    pub fn load_directory(&self) -> Result<UserDirectory, ConfigError> {
        let directory = match &self.user_directory_path {
            Some(path) => UserDirectory::load(path)?,
            None => UserDirectory::open(),
        };
        Ok(directory)
    }
}

/// Parse an env var, falling back to `default` when missing or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| Path::new(v.trim()).to_path_buf())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
