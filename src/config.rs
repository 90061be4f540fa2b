//! Host configuration from environment variables.
//!
//! - `JOY_DEBUG`: "true"/"false"/"1"/"0" (default false). Frame-rate overlay
//!   and sprite outlines.
//! - `JOY_RUN_MS`: how long the session runs (default 1000).
//! - `JOY_FRAME_MS`: frame period of the native host (default 16).
//! - `JOY_WIDTH` / `JOY_HEIGHT`: surface size (default 320×240).
//! - `JOY_BEHAVIOUR_MS`: actor update period (default 100).
//!
//! Unparseable numbers fall back to their defaults; an unparseable boolean is
//! an error.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use serde::Serialize;

const DEFAULT_RUN_MS: u64 = 1000;
const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
const DEFAULT_BEHAVIOUR_MS: u64 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A boolean variable held something other than true/false/1/0.
    #[error("invalid boolean for {var}: {value:?}")]
    InvalidBool { var: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostConfig {
    pub debug: bool,
    pub run_ms: u64,
    pub frame_ms: u64,
    pub width: u32,
    pub height: u32,
    pub behaviour_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            debug: false,
            run_ms: DEFAULT_RUN_MS,
            frame_ms: DEFAULT_FRAME_MS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            behaviour_ms: DEFAULT_BEHAVIOUR_MS,
        }
    }
}

impl HostConfig {
    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] if `JOY_DEBUG` is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its
    /// value if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] if `JOY_DEBUG` is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let debug = match lookup("JOY_DEBUG") {
            None => false,
            Some(value) => parse_bool("JOY_DEBUG", &value)?,
        };
        Ok(Self {
            debug,
            run_ms: parse_or(&lookup, "JOY_RUN_MS", DEFAULT_RUN_MS),
            frame_ms: parse_or(&lookup, "JOY_FRAME_MS", DEFAULT_FRAME_MS),
            width: parse_or(&lookup, "JOY_WIDTH", DEFAULT_WIDTH),
            height: parse_or(&lookup, "JOY_HEIGHT", DEFAULT_HEIGHT),
            behaviour_ms: parse_or(&lookup, "JOY_BEHAVIOUR_MS", DEFAULT_BEHAVIOUR_MS),
        })
    }

    #[must_use]
    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_ms)
    }

    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool { var: var.to_owned(), value: value.to_owned() }),
    }
}
