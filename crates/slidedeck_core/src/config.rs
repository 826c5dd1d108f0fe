//! Editing session configuration.
//!
//! # Responsibility
//! - Hold the coalescing knobs (quiet window, hard ceiling) and the history
//!   depth bound as configuration instead of hidden constants.
//!
//! # Invariants
//! - Every field has a default, so partial JSON is accepted.
//! - `max_wait_ms >= quiet_window_ms > 0` after validation.

use crate::coalesce::coalescer::CoalescePolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_QUIET_WINDOW_MS: u64 = 4_000;
pub const DEFAULT_MAX_WAIT_MS: u64 = 10_000;
pub const DEFAULT_PREVIEW_CHARS: usize = 40;

fn default_quiet_window_ms() -> u64 {
    DEFAULT_QUIET_WINDOW_MS
}

fn default_max_wait_ms() -> u64 {
    DEFAULT_MAX_WAIT_MS
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

/// Tunables for one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Commit coalesced input after this much silence per region.
    #[serde(default = "default_quiet_window_ms")]
    pub quiet_window_ms: u64,
    /// Force a commit once input has been pending this long.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    /// Maximum retained undo entries; `None` keeps everything.
    #[serde(default)]
    pub max_history_depth: Option<usize>,
    /// Characters of new text shown in history descriptions.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_window_ms: DEFAULT_QUIET_WINDOW_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            max_history_depth: None,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl EditorConfig {
    /// Parses and validates a JSON config payload.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quiet_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "quiet_window_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_wait_ms < self.quiet_window_ms {
            return Err(ConfigError::Invalid(format!(
                "max_wait_ms ({}) must be >= quiet_window_ms ({})",
                self.max_wait_ms, self.quiet_window_ms
            )));
        }
        if self.max_history_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_history_depth must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn coalesce_policy(&self) -> CoalescePolicy {
        CoalescePolicy {
            quiet_window: Duration::from_millis(self.quiet_window_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
        }
    }
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
