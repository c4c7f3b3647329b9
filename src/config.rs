/// Engine configuration.
///
/// Loaded once at startup from a TOML file (see `growth.toml` at the crate
/// root for every key with its default). Every field has a default, so an
/// empty file or no file at all yields a working configuration.
///
/// Percentile category cut points are deliberately absent: they are fixed
/// constants in `percentile` so every caller sees the same bands.

use crate::logging::{self, Component, LogLevel};
use crate::model::Metric;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

/// Environment variable naming a TOML config file.
pub const CONFIG_PATH_ENV: &str = "GROWTH_CONFIG";

/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "GROWTH_LOG_LEVEL";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct GrowthConfig {
    pub store: StoreConfig,
    pub velocity: VelocityConfig,
    pub alerts: AlertConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How far before the latest stored record a new one may be timestamped.
    pub out_of_order_tolerance_hours: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            out_of_order_tolerance_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Shortest span a rate may be computed over.
    pub min_span_days: f64,
    /// How far before the window start the bounding record may lie.
    pub window_slack_days: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min_span_days: 1.0,
            window_slack_days: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// How many records back the crossing rule compares against.
    pub crossing_lookback_records: usize,
    /// Major centile lines that must be crossed, per metric.
    pub crossing_lines: CrossingLines,
    /// Trailing window for the stalled growth rule.
    pub stall_window_days: u32,
    /// Growth is expected to be strictly positive up to this age.
    pub stall_max_age_months: f64,
    /// Longest gap between the two latest records before an informational alert.
    pub max_measurement_gap_days: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            crossing_lookback_records: 2,
            crossing_lines: CrossingLines::default(),
            stall_window_days: 60,
            stall_max_age_months: 24.0,
            max_measurement_gap_days: 92,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrossingLines {
    pub weight: u32,
    pub height: u32,
    pub head_circumference: u32,
}

impl Default for CrossingLines {
    fn default() -> Self {
        Self {
            weight: 2,
            height: 2,
            head_circumference: 2,
        }
    }
}

impl CrossingLines {
    pub fn for_metric(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Weight => self.weight,
            Metric::Height => self.height,
            Metric::HeadCircumference => self.head_circumference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(String),
    /// The config file is not valid TOML for this layout.
    Parse(String),
    /// A value is outside its allowed range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl GrowthConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GrowthConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `.env`, then the file named by `GROWTH_CONFIG` (defaults when
    /// unset), then applies `GROWTH_LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            config.logging.level = level
                .parse()
                .map_err(|e: String| ConfigError::Invalid(format!("{}: {}", LOG_LEVEL_ENV, e)))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.velocity.min_span_days.is_finite() || self.velocity.min_span_days <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "velocity.min_span_days must be positive, got {}",
                self.velocity.min_span_days
            )));
        }
        if !self.velocity.window_slack_days.is_finite() || self.velocity.window_slack_days < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "velocity.window_slack_days must be non-negative, got {}",
                self.velocity.window_slack_days
            )));
        }
        if self.alerts.crossing_lookback_records == 0 {
            return Err(ConfigError::Invalid(
                "alerts.crossing_lookback_records must be at least 1".to_string(),
            ));
        }
        for metric in Metric::ALL {
            if self.alerts.crossing_lines.for_metric(metric) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "alerts.crossing_lines for {} must be at least 1",
                    metric
                )));
            }
        }
        if self.alerts.stall_window_days == 0 {
            return Err(ConfigError::Invalid(
                "alerts.stall_window_days must be at least 1".to_string(),
            ));
        }
        if !self.alerts.stall_max_age_months.is_finite() || self.alerts.stall_max_age_months < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "alerts.stall_max_age_months must be non-negative, got {}",
                self.alerts.stall_max_age_months
            )));
        }
        if self.alerts.max_measurement_gap_days == 0 {
            return Err(ConfigError::Invalid(
                "alerts.max_measurement_gap_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Installs the global logger described by the `[logging]` section.
    pub fn init_logging(&self) {
        logging::init_logger(
            self.logging.level,
            self.logging.file.as_deref(),
            self.logging.console_timestamps,
        );
        logging::debug(
            Component::Config,
            None,
            &format!(
                "Stall window {} days, crossing lookback {} records, gap limit {} days",
                self.alerts.stall_window_days,
                self.alerts.crossing_lookback_records,
                self.alerts.max_measurement_gap_days
            ),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
