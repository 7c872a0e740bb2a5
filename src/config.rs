//! Scheduler configuration — session defaults and sink selection loaded from ~/.lookahead/scheduler.yaml.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sink::osc::DEFAULT_ADDRESS_PREFIX;
use crate::sink::{event_ring, EventConsumer, RingSink};

/// OSC target used when none is configured.
pub const DEFAULT_OSC_TARGET: &str = "127.0.0.1:57120";

/// Where the host process sends outbound messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// JSON lines on stdout.
    #[default]
    Stdout,
    /// OSC over UDP.
    Osc {
        #[serde(default = "default_osc_target")]
        target: String,
        #[serde(default = "default_osc_prefix")]
        address_prefix: String,
    },
}

/// Scheduler configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Tempo used when an `init` carries an unusable one and no session exists.
    #[serde(default = "default_bpm")]
    pub default_bpm: f64,
    /// Lookahead horizon used when an `init` omits it or sends a bad value.
    #[serde(default = "default_lookahead_sec")]
    pub lookahead_sec: f64,
    /// Tick interval used when an `init` omits it or sends a bad value.
    #[serde(default = "default_tick_sec")]
    pub tick_sec: f64,
    /// Capacity of the ring sink handed out by [`SchedulerConfig::event_ring`].
    ///
    /// Only read when the scheduler is embedded next to an in-process audio
    /// thread; the stdout and OSC host outputs do not queue.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_bpm() -> f64 {
    120.0
}

fn default_lookahead_sec() -> f64 {
    0.35
}

fn default_tick_sec() -> f64 {
    0.05
}

fn default_command_capacity() -> usize {
    256
}

fn default_osc_target() -> String {
    DEFAULT_OSC_TARGET.to_string()
}

fn default_osc_prefix() -> String {
    DEFAULT_ADDRESS_PREFIX.to_string()
}

/// Failure to read an explicitly requested config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config i/o error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Standard config location.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".lookahead");
    path.push("scheduler.yaml");
    path
}

impl SchedulerConfig {
    /// Load config from the standard path (~/.lookahead/scheduler.yaml).
    /// Returns None if the file doesn't exist or doesn't parse (graceful fallback).
    pub fn load() -> Option<Self> {
        let content = std::fs::read_to_string(default_config_path()).ok()?;
        serde_yaml::from_str::<Self>(&content)
            .ok()
            .map(Self::validated)
    }

    /// Load config from an explicit path. Errors are reported, not swallowed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config.validated())
    }

    /// Ring sink and its consumer, sized by `command_capacity`.
    pub fn event_ring(&self) -> (RingSink, EventConsumer) {
        event_ring(self.command_capacity)
    }

    /// Replace unusable values with their defaults.
    pub fn validated(mut self) -> Self {
        if !(self.default_bpm.is_finite() && self.default_bpm > 0.0) {
            log::warn!("config default_bpm {} unusable, using {}", self.default_bpm, default_bpm());
            self.default_bpm = default_bpm();
        }
        if !(self.lookahead_sec.is_finite() && self.lookahead_sec > 0.0) {
            log::warn!(
                "config lookahead_sec {} unusable, using {}",
                self.lookahead_sec,
                default_lookahead_sec()
            );
            self.lookahead_sec = default_lookahead_sec();
        }
        if !(self.tick_sec.is_finite() && self.tick_sec > 0.0) {
            log::warn!("config tick_sec {} unusable, using {}", self.tick_sec, default_tick_sec());
            self.tick_sec = default_tick_sec();
        }
        if self.command_capacity == 0 {
            self.command_capacity = default_command_capacity();
        }
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_bpm: default_bpm(),
            lookahead_sec: default_lookahead_sec(),
            tick_sec: default_tick_sec(),
            command_capacity: default_command_capacity(),
            sink: SinkConfig::default(),
        }
    }
}
