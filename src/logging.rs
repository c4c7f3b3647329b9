/// Structured logging for the growth monitoring engine
///
/// Provides context-rich logging tagged with the engine component and,
/// where relevant, the subject identifier. Supports console output and
/// optional append-only file logging. Nothing is emitted until the host
/// calls `init_logger`.

use crate::model::{GrowthError, SubjectId};
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Reference,
    Store,
    Service,
    Alerts,
    Config,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Reference => write!(f, "REF"),
            Component::Store => write!(f, "STORE"),
            Component::Service => write!(f, "SVC"),
            Component::Alerts => write!(f, "ALERT"),
            Component::Config => write!(f, "CFG"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Caller data problem: bad value, late entry, not enough measurements yet
    Expected,
    /// Integration problem: the caller skipped or contradicted profile registration
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

/// Classify an engine error by who has to act on it.
pub fn classify_failure(err: &GrowthError) -> FailureType {
    match err {
        GrowthError::OutOfRange { .. }
        | GrowthError::InvalidMeasurement(_)
        | GrowthError::OutOfOrder { .. }
        | GrowthError::NoData { .. }
        | GrowthError::InsufficientData(_) => FailureType::Expected,
        GrowthError::UnknownSubject(_) | GrowthError::ProfileConflict(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    fn format_entry(level: LogLevel, component: Component, subject: Option<&SubjectId>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, subject_part, message)
    }

    fn log(&self, level: LogLevel, component: Component, subject: Option<&SubjectId>, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = Self::format_entry(level, component, subject, message);
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, subject_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, subject_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", component, subject_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize (or replace) the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
    };
    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }
}

fn emit(level: LogLevel, component: Component, subject: Option<&SubjectId>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, subject, message);
        }
    }
}

pub fn info(component: Component, subject: Option<&SubjectId>, message: &str) {
    emit(LogLevel::Info, component, subject, message);
}

pub fn warn(component: Component, subject: Option<&SubjectId>, message: &str) {
    emit(LogLevel::Warning, component, subject, message);
}

pub fn debug(component: Component, subject: Option<&SubjectId>, message: &str) {
    emit(LogLevel::Debug, component, subject, message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a rejected operation with automatic classification
pub fn log_rejection(subject: &SubjectId, operation: &str, err: &GrowthError) {
    let failure_type = classify_failure(err);
    let message = format!("{} rejected [{}]: {}", operation, failure_type, err);
    match failure_type {
        FailureType::Expected => debug(Component::Service, Some(subject), &message),
        FailureType::Unexpected => warn(Component::Service, Some(subject), &message),
    }
}

/// Log the outcome of an alert evaluation pass
pub fn log_alert_summary(subject: &SubjectId, records: usize, warnings: usize, informational: usize) {
    let message = format!(
        "Alert evaluation over {} record(s): {} warning(s), {} informational",
        records, warnings, informational
    );
    if warnings == 0 {
        debug(Component::Alerts, Some(subject), &message);
    } else {
        info(Component::Alerts, Some(subject), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_str_accepts_aliases() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!(" warning ".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_failure_classification() {
        let data_issue = GrowthError::InsufficientData("one record".to_string());
        assert_eq!(classify_failure(&data_issue), FailureType::Expected);

        let integration_issue = GrowthError::UnknownSubject(SubjectId::new("ghost"));
        assert_eq!(classify_failure(&integration_issue), FailureType::Unexpected);
    }

    #[test]
    fn test_entry_format_includes_component_and_subject() {
        let subject = SubjectId::new("child-7");
        let entry = Logger::format_entry(LogLevel::Warning, Component::Store, Some(&subject), "late record");
        assert!(entry.ends_with("WARN STORE [child-7]: late record"), "got {}", entry);
    }
}
