//! Configuration for the built-in formatting sink.
//!
//! Mirrors the convention used elsewhere in the workspace: a small builder
//! with sensible defaults (text format, stderr, timestamps on) that callers
//! adjust at startup.

use std::str::FromStr;
use thiserror::Error;

use crate::sink::FmtSink;

/// Errors that can occur while configuring a sink
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The format name was not recognized
    #[error("unknown line format: {0}. Expected one of: text, json")]
    UnknownFormat(String),
}

/// Output format for emitted lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// Single-line `key=value` text, quoted where needed
    #[default]
    Text,

    /// One JSON object per line for machine-readable logs
    Json,
}

impl FromStr for LineFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LineFormat::Text),
            "json" => Ok(LineFormat::Json),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

/// Output destination for emitted lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineOutput {
    /// Write to standard error
    #[default]
    Stderr,

    /// Write to standard output
    Stdout,
}

/// Configuration for a [`FmtSink`]
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output format
    pub format: LineFormat,

    /// Output destination
    pub output: LineOutput,

    /// Whether to prepend an RFC 3339 timestamp to each line
    pub timestamps: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            format: LineFormat::Text,
            output: LineOutput::Stderr,
            timestamps: true,
        }
    }
}

impl SinkConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format
    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output destination
    pub fn with_output(mut self, output: LineOutput) -> Self {
        self.output = output;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Build the formatting sink described by this configuration
    pub fn build(self) -> FmtSink {
        FmtSink::new(self)
    }
}
