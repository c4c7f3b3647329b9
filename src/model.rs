/// Core data types for the growth monitoring engine.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no statistical logic and no I/O, only types, their
/// validation, and the error taxonomy every operation reports through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Time conversion constants
// ---------------------------------------------------------------------------

/// Average days per month used by the WHO growth standards.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Days per week.
pub const DAYS_PER_WEEK: f64 = 7.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Metric and sex
// ---------------------------------------------------------------------------

/// Anthropometric quantity tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    Height,
    HeadCircumference,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Weight, Metric::Height, Metric::HeadCircumference];

    /// Unit the measurement is expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Weight => "kg",
            Metric::Height | Metric::HeadCircumference => "cm",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Weight => write!(f, "weight"),
            Metric::Height => write!(f, "height"),
            Metric::HeadCircumference => write!(f, "head circumference"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

/// Opaque caller-assigned subject identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        SubjectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sex and birth time of a subject, owned by the caller's profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub id: SubjectId,
    pub sex: Sex,
    pub birth: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

/// Elapsed time since birth.
///
/// Stored in days so that month- and week-based callers convert through
/// the same constants (`DAYS_PER_MONTH`, `DAYS_PER_WEEK`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Age {
    days: f64,
}

impl Age {
    pub fn from_days(days: f64) -> Self {
        Age { days }
    }

    pub fn from_weeks(weeks: f64) -> Self {
        Age { days: weeks * DAYS_PER_WEEK }
    }

    pub fn from_months(months: f64) -> Self {
        Age { days: months * DAYS_PER_MONTH }
    }

    /// Age at `at` for a subject born at `birth`. Negative if `at` precedes birth.
    pub fn between(birth: DateTime<Utc>, at: DateTime<Utc>) -> Self {
        Age::from_days(days_between(birth, at))
    }

    pub fn days(&self) -> f64 {
        self.days
    }

    pub fn weeks(&self) -> f64 {
        self.days / DAYS_PER_WEEK
    }

    pub fn months(&self) -> f64 {
        self.days / DAYS_PER_MONTH
    }
}

/// Signed fractional days from `from` to `to`.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    let millis = delta.num_milliseconds() as f64;
    millis / 1_000.0 / SECONDS_PER_DAY
}

/// Signed fractional months from `from` to `to`.
pub fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    days_between(from, to) / DAYS_PER_MONTH
}

// ---------------------------------------------------------------------------
// Measurement records
// ---------------------------------------------------------------------------

/// Process-unique identity of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One observation of one subject. Immutable once stored; corrections are
/// entered as a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: RecordId,
    pub subject_id: SubjectId,
    pub timestamp: DateTime<Utc>,
    pub age: Age,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub head_circumference_cm: Option<f64>,
}

impl MeasurementRecord {
    /// Value recorded for `metric`, `None` only for an absent head circumference.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Weight => Some(self.weight_kg),
            Metric::Height => Some(self.height_cm),
            Metric::HeadCircumference => self.head_circumference_cm,
        }
    }

    /// Checks the measurement values and the age derived from the timestamp.
    pub fn validate(&self) -> Result<(), GrowthError> {
        if !self.age.days().is_finite() || self.age.days() < 0.0 {
            return Err(GrowthError::InvalidMeasurement(format!(
                "record {} taken before birth of subject {}",
                self.timestamp.to_rfc3339(),
                self.subject_id
            )));
        }
        validate_value(Metric::Weight, self.weight_kg)?;
        validate_value(Metric::Height, self.height_cm)?;
        if let Some(hc) = self.head_circumference_cm {
            validate_value(Metric::HeadCircumference, hc)?;
        }
        Ok(())
    }
}

/// A measured value must be a positive finite number.
pub fn validate_value(metric: Metric, value: f64) -> Result<(), GrowthError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GrowthError::InvalidMeasurement(format!(
            "{} must be a positive finite number, got {}",
            metric, value
        )))
    }
}

// ---------------------------------------------------------------------------
// Computed results
// ---------------------------------------------------------------------------

/// Qualitative percentile band.
///
/// Cut points (percentile `p`):
///   p < 3        → VeryLow
///   3 ≤ p < 85   → Normal
///   85 ≤ p ≤ 97  → High
///   p > 97       → VeryHigh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    VeryLow,
    Normal,
    High,
    VeryHigh,
}

impl Category {
    /// Metric-specific wording for the band.
    pub fn label(&self, metric: Metric) -> &'static str {
        match (metric, self) {
            (Metric::Weight, Category::VeryLow) => "underweight",
            (Metric::Weight, Category::Normal) => "normal",
            (Metric::Weight, Category::High) => "at risk of overweight",
            (Metric::Weight, Category::VeryHigh) => "overweight",
            (Metric::Height, Category::VeryLow) => "stunted",
            (Metric::Height, Category::Normal) => "normal",
            (Metric::Height, Category::High) => "tall",
            (Metric::Height, Category::VeryHigh) => "very tall",
            (Metric::HeadCircumference, Category::VeryLow) => "small",
            (Metric::HeadCircumference, Category::Normal) => "normal",
            (Metric::HeadCircumference, Category::High) => "large",
            (Metric::HeadCircumference, Category::VeryHigh) => "very large",
        }
    }
}

/// Population-relative standing of one measured value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub metric: Metric,
    /// Percent of the reference population at or below the value, in [0, 100].
    pub percentile: f64,
    pub z_score: f64,
    pub category: Category,
}

/// Rate of change of a metric, in metric units per month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRate {
    pub metric: Metric,
    pub per_month: f64,
    /// Time span the rate was computed over.
    pub span_months: f64,
    /// Number of records inside the span.
    pub records_used: usize,
    pub first_record: RecordId,
    pub last_record: RecordId,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by the analytics operations.
///
/// None of these are recovered locally: each one changes what the caller
/// should tell the end user.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthError {
    /// Age lies outside the reference table's supported range.
    OutOfRange {
        metric: Metric,
        age_months: f64,
        min_months: f64,
        max_months: f64,
    },
    /// A measured value is non-positive, non-finite, or taken before birth.
    InvalidMeasurement(String),
    /// The timestamp is too far before the subject's latest stored record.
    OutOfOrder {
        subject: SubjectId,
        timestamp: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// No record carries a value for the requested metric.
    NoData { subject: SubjectId, metric: Metric },
    /// Fewer than two usable records, or a degenerate time span.
    InsufficientData(String),
    /// No profile was registered for the subject.
    UnknownSubject(SubjectId),
    /// The subject is already registered with a different sex or birth time.
    ProfileConflict(SubjectId),
}

impl fmt::Display for GrowthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowthError::OutOfRange {
                metric,
                age_months,
                min_months,
                max_months,
            } => write!(
                f,
                "Age out of range: {:.2} months is outside the {} reference range [{}, {}]",
                age_months, metric, min_months, max_months
            ),
            GrowthError::InvalidMeasurement(msg) => write!(f, "Invalid measurement: {}", msg),
            GrowthError::OutOfOrder {
                subject,
                timestamp,
                latest,
            } => write!(
                f,
                "Out of order: record at {} for subject {} precedes latest record at {}",
                timestamp.to_rfc3339(),
                subject,
                latest.to_rfc3339()
            ),
            GrowthError::NoData { subject, metric } => {
                write!(f, "No data: subject {} has no {} measurements", subject, metric)
            }
            GrowthError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            GrowthError::UnknownSubject(subject) => write!(f, "Unknown subject: {}", subject),
            GrowthError::ProfileConflict(subject) => {
                write!(f, "Profile conflict: subject {} is registered with a different profile", subject)
            }
        }
    }
}

impl std::error::Error for GrowthError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
