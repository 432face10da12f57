//! CLI configuration management
//!
//! Handles loading configuration from TOML files, environment variables and
//! command-line arguments.
//!
//! Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (`NOTE_LOG_LEVEL`, `NOTE_OUTPUT_FORMAT`,
//!    `NOTE_REQUIRE_FINAL`)
//! 3. Config file
//! 4. Default values

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use note_core::types::MAX_PERIOD;
use note_settlement::SettlementConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "NOTE_LOG_LEVEL";
/// Environment variable overriding the output format
pub const ENV_OUTPUT_FORMAT: &str = "NOTE_OUTPUT_FORMAT";
/// Environment variable overriding price finality enforcement
pub const ENV_REQUIRE_FINAL: &str = "NOTE_REQUIRE_FINAL";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting holds a value outside its vocabulary
    #[error("{setting} {value:?} is not one of: {expected}")]
    UnknownValue {
        /// Setting name
        setting: &'static str,
        /// Rejected value
        value: String,
        /// Accepted values
        expected: &'static str,
    },

    /// Config file could not be read or parsed
    #[error("{path}: {reason}")]
    File {
        /// Config file
        path: PathBuf,
        /// Read or parse failure
        reason: String,
    },

    /// Settlement settings are out of range
    #[error("settlement: {0}")]
    Validation(String),
}

/// Parses a log level (`off`, `error` .. `trace`, or 0-5)
pub fn parse_log_level(value: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(value).map_err(|_| ConfigError::UnknownValue {
        setting: "log level",
        value: value.to_string(),
        expected: "off, error, warn, info, debug, trace",
    })
}

fn parse_flag(setting: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::UnknownValue {
            setting,
            value: value.to_string(),
            expected: "true, false, 1, 0, yes, no",
        }),
    }
}

/// Output formats for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned text columns
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::UnknownValue {
                setting: "output format",
                value: s.to_string(),
                expected: "table, json",
            }),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// CLI configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default log level; `RUST_LOG` directives are applied on top
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LevelFilter,
    /// Output format
    #[serde(deserialize_with = "deserialize_parsed")]
    pub output_format: OutputFormat,
    /// Default scenario file
    pub scenario: Option<PathBuf>,
    /// Settlement behaviour
    pub settlement: SettlementConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_log_level(&s).map_err(serde::de::Error::custom)
}

fn deserialize_parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::WARN,
            output_format: OutputFormat::default(),
            scenario: None,
            settlement: SettlementConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let config: CliConfig = toml::from_str(&content).map_err(|e| file_error(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Override values from process environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override values from an environment lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = parse_log_level(&level)?;
        }
        if let Some(format) = lookup(ENV_OUTPUT_FORMAT) {
            self.output_format = OutputFormat::from_str(&format)?;
        }
        if let Some(required) = lookup(ENV_REQUIRE_FINAL) {
            self.settlement.require_final_prices = parse_flag(ENV_REQUIRE_FINAL, &required)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settlement.dispute_period_secs > MAX_PERIOD {
            return Err(ConfigError::Validation(format!(
                "dispute_period_secs {} exceeds {}",
                self.settlement.dispute_period_secs, MAX_PERIOD
            )));
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = parse_log_level(level)?;
        } else if cli.verbose {
            self.log_level = LevelFilter::DEBUG;
        }
        if let Some(format) = &cli.format {
            self.output_format = OutputFormat::from_str(format)?;
        }
        if let Some(scenario) = &cli.scenario {
            self.scenario = Some(scenario.clone());
        }
        Ok(())
    }
}

/// CLI arguments relevant to configuration
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Scenario file override
    pub scenario: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Output format override
    pub format: Option<String>,
    /// Verbose logging
    pub verbose: bool,
}

/// Build configuration from all sources
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    config.apply_env()?;
    config.merge_with_cli(cli)?;
    config.validate()?;
    Ok(config)
}
