use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::sync::clock::ClockMode;
use crate::sync::resolver::{DISPLAY_CUE_PAD_SECS, Tolerance, WORD_LEAD_SECS, WORD_LINGER_SECS};

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Sync loop settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Cue and word containment tolerances
    #[serde(default)]
    pub tolerance: ToleranceConfig,

    /// Terminal display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Sync loop configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Sampling period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Where playback time comes from
    #[serde(default)]
    pub clock_mode: ClockMode,

    /// Offset applied when a session starts, in seconds
    #[serde(default)]
    pub initial_offset_secs: f64,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            clock_mode: ClockMode::default(),
            initial_offset_secs: 0.0,
        }
    }
}

/// Containment tolerances, in seconds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToleranceConfig {
    /// Padding on both cue edges while rendering
    #[serde(default = "default_cue_pad_secs")]
    pub cue_pad_secs: f64,

    /// Highlight a word this early
    #[serde(default = "default_word_lead_secs")]
    pub word_lead_secs: f64,

    /// Keep a word highlighted this long after it ends
    #[serde(default = "default_word_linger_secs")]
    pub word_linger_secs: f64,
}

impl ToleranceConfig {
    pub fn to_tolerance(&self) -> Tolerance {
        Tolerance {
            cue_pad: self.cue_pad_secs,
            word_lead: self.word_lead_secs,
            word_linger: self.word_linger_secs,
        }
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            cue_pad_secs: default_cue_pad_secs(),
            word_lead_secs: default_word_lead_secs(),
            word_linger_secs: default_word_linger_secs(),
        }
    }
}

/// Terminal display configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DisplayConfig {
    /// Words to mark for lookup (case-insensitive)
    #[serde(default)]
    pub highlight_words: Vec<String>,

    /// Prefix each line with the clock reading
    #[serde(default)]
    pub show_timecodes: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_cue_pad_secs() -> f64 {
    DISPLAY_CUE_PAD_SECS
}

fn default_word_lead_secs() -> f64 {
    WORD_LEAD_SECS
}

fn default_word_linger_secs() -> f64 {
    WORD_LINGER_SECS
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config at `path`, writing the defaults there first if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.sync.poll_interval_ms == 0 {
            return Err(anyhow!("Poll interval must be greater than zero"));
        }

        if !self.sync.initial_offset_secs.is_finite() {
            return Err(anyhow!("Initial offset must be a finite number of seconds"));
        }

        let tolerances = [
            ("cue_pad_secs", self.tolerance.cue_pad_secs),
            ("word_lead_secs", self.tolerance.word_lead_secs),
            ("word_linger_secs", self.tolerance.word_linger_secs),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("Tolerance {} must be a non-negative number, got {}", name, value));
            }
        }

        Ok(())
    }
}
