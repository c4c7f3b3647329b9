/// Reference distribution table for the growth monitoring engine.
///
/// Holds the LMS parameters (skewness L, median M, coefficient of
/// variation S) of the population reference for every (metric, sex) pair on
/// a discrete age grid. This is the single source of truth for reference
/// data: no other module hardcodes distribution parameters.
///
/// The dataset is a TOML resource embedded at compile time and validated
/// when the table is built. A table that fails validation is never handed
/// out, since it indicates corrupt reference data.
///
/// Ages between grid points are served by interpolating L, M and S
/// independently; z-scores and percentiles are never interpolated.

use crate::logging::{self, Component};
use crate::model::{Age, GrowthError, Metric, Sex};
use serde::Deserialize;
use std::fmt;

/// WHO Child Growth Standards, 0-24 months, monthly grid.
pub const EMBEDDED_DATASET: &str = include_str!("../data/who_child_growth.toml");

const SERIES_KEYS: [(Metric, Sex); 6] = [
    (Metric::Weight, Sex::Male),
    (Metric::Weight, Sex::Female),
    (Metric::Height, Sex::Male),
    (Metric::Height, Sex::Female),
    (Metric::HeadCircumference, Sex::Male),
    (Metric::HeadCircumference, Sex::Female),
];

// Slack allowed when comparing a grid gap to the declared resolution.
const GAP_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Table types
// ---------------------------------------------------------------------------

/// Distribution parameters at one age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmsParams {
    pub l: f64,
    pub m: f64,
    pub s: f64,
}

impl LmsParams {
    fn lerp(&self, other: &LmsParams, t: f64) -> LmsParams {
        LmsParams {
            l: self.l + (other.l - self.l) * t,
            m: self.m + (other.m - self.m) * t,
            s: self.s + (other.s - self.s) * t,
        }
    }
}

/// One grid row of a reference series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRow {
    pub age_months: f64,
    pub lms: LmsParams,
}

/// Immutable, validated reference table.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    resolution_months: f64,
    edge_tolerance_months: f64,
    // Indexed by `slot(metric, sex)`.
    series: [Vec<ReferenceRow>; 6],
}

#[derive(Debug, Deserialize)]
struct RawTable {
    resolution_months: f64,
    edge_tolerance_months: f64,
    series: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    metric: Metric,
    sex: Sex,
    rows: Vec<[f64; 4]>,
}

fn slot(metric: Metric, sex: Sex) -> usize {
    let m = match metric {
        Metric::Weight => 0,
        Metric::Height => 1,
        Metric::HeadCircumference => 2,
    };
    let s = match sex {
        Sex::Male => 0,
        Sex::Female => 1,
    };
    m * 2 + s
}

// ---------------------------------------------------------------------------
// Load-time errors
// ---------------------------------------------------------------------------

/// Fatal problems with the reference dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// The resource is not valid TOML or does not match the expected layout.
    Parse(String),
    /// `resolution_months` or `edge_tolerance_months` is unusable.
    InvalidHeader(String),
    /// A (metric, sex) pair appears more than once.
    DuplicateSeries { metric: Metric, sex: Sex },
    /// A (metric, sex) pair has no series.
    MissingSeries { metric: Metric, sex: Sex },
    /// A row violates the table invariants.
    InvalidRow {
        metric: Metric,
        sex: Sex,
        age_months: f64,
        reason: String,
    },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::Parse(msg) => write!(f, "Reference data parse error: {}", msg),
            ReferenceError::InvalidHeader(msg) => write!(f, "Reference data header invalid: {}", msg),
            ReferenceError::DuplicateSeries { metric, sex } => {
                write!(f, "Duplicate reference series for {} ({})", metric, sex)
            }
            ReferenceError::MissingSeries { metric, sex } => {
                write!(f, "Missing reference series for {} ({})", metric, sex)
            }
            ReferenceError::InvalidRow {
                metric,
                sex,
                age_months,
                reason,
            } => write!(
                f,
                "Invalid reference row for {} ({}) at {} months: {}",
                metric, sex, age_months, reason
            ),
        }
    }
}

impl std::error::Error for ReferenceError {}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl ReferenceTable {
    /// Builds the table from the embedded WHO dataset.
    pub fn embedded() -> Result<Self, ReferenceError> {
        let table = Self::from_toml_str(EMBEDDED_DATASET)?;
        let (min, max) = table.grid_span(Metric::Weight, Sex::Male);
        logging::info(
            Component::Reference,
            None,
            &format!(
                "Loaded reference table: {} series, grid {}-{} months",
                SERIES_KEYS.len(),
                min,
                max
            ),
        );
        Ok(table)
    }

    /// Parses and validates a dataset in the embedded TOML layout.
    pub fn from_toml_str(source: &str) -> Result<Self, ReferenceError> {
        let raw: RawTable =
            toml::from_str(source).map_err(|e| ReferenceError::Parse(e.to_string()))?;

        if !raw.resolution_months.is_finite() || raw.resolution_months <= 0.0 {
            return Err(ReferenceError::InvalidHeader(format!(
                "resolution_months must be positive, got {}",
                raw.resolution_months
            )));
        }
        if !raw.edge_tolerance_months.is_finite()
            || raw.edge_tolerance_months < 0.0
            || raw.edge_tolerance_months >= raw.resolution_months
        {
            return Err(ReferenceError::InvalidHeader(format!(
                "edge_tolerance_months must be in [0, {}), got {}",
                raw.resolution_months, raw.edge_tolerance_months
            )));
        }

        let mut series: [Option<Vec<ReferenceRow>>; 6] = Default::default();
        for raw_series in raw.series {
            let idx = slot(raw_series.metric, raw_series.sex);
            if series[idx].is_some() {
                return Err(ReferenceError::DuplicateSeries {
                    metric: raw_series.metric,
                    sex: raw_series.sex,
                });
            }
            let rows = validate_series(&raw_series, raw.resolution_months)?;
            series[idx] = Some(rows);
        }

        let mut complete: [Vec<ReferenceRow>; 6] = Default::default();
        for (metric, sex) in SERIES_KEYS {
            let idx = slot(metric, sex);
            complete[idx] = series[idx]
                .take()
                .ok_or(ReferenceError::MissingSeries { metric, sex })?;
        }

        Ok(ReferenceTable {
            resolution_months: raw.resolution_months,
            edge_tolerance_months: raw.edge_tolerance_months,
            series: complete,
        })
    }
}

fn validate_series(raw: &RawSeries, resolution: f64) -> Result<Vec<ReferenceRow>, ReferenceError> {
    let invalid = |age_months: f64, reason: String| ReferenceError::InvalidRow {
        metric: raw.metric,
        sex: raw.sex,
        age_months,
        reason,
    };

    if raw.rows.len() < 2 {
        return Err(invalid(
            raw.rows.first().map(|r| r[0]).unwrap_or(0.0),
            "a series needs at least two grid points".to_string(),
        ));
    }

    let mut rows: Vec<ReferenceRow> = Vec::with_capacity(raw.rows.len());
    for &[age, l, m, s] in &raw.rows {
        if [age, l, m, s].iter().any(|v| !v.is_finite()) {
            return Err(invalid(age, "non-finite value".to_string()));
        }
        if age < 0.0 {
            return Err(invalid(age, "negative age".to_string()));
        }
        if m <= 0.0 {
            return Err(invalid(age, format!("M must be positive, got {}", m)));
        }
        if s <= 0.0 {
            return Err(invalid(age, format!("S must be positive, got {}", s)));
        }
        if let Some(prev) = rows.last() {
            if age <= prev.age_months {
                return Err(invalid(
                    age,
                    format!("ages must be strictly increasing (previous {})", prev.age_months),
                ));
            }
            if age - prev.age_months > resolution + GAP_EPSILON {
                return Err(invalid(
                    age,
                    format!(
                        "gap of {} months exceeds resolution {}",
                        age - prev.age_months,
                        resolution
                    ),
                ));
            }
        }
        rows.push(ReferenceRow {
            age_months: age,
            lms: LmsParams { l, m, s },
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

impl ReferenceTable {
    /// LMS parameters for `metric` and `sex` at `age_months`.
    ///
    /// Exact grid ages return the row unmodified. Ages strictly between two
    /// grid points return L, M and S interpolated linearly. Ages within
    /// `edge_tolerance_months` outside the grid are clamped to the edge row;
    /// anything further out is `OutOfRange`.
    pub fn lookup(&self, metric: Metric, sex: Sex, age_months: f64) -> Result<LmsParams, GrowthError> {
        let rows = self.grid(metric, sex);
        let (min, max) = self.supported_range(metric, sex);
        if !age_months.is_finite() || age_months < min || age_months > max {
            return Err(GrowthError::OutOfRange {
                metric,
                age_months,
                min_months: min,
                max_months: max,
            });
        }

        let (first, last) = self.grid_span(metric, sex);
        let age = age_months.clamp(first, last);

        // Number of rows at or below `age`; at least 1 after clamping.
        let upper = rows.partition_point(|r| r.age_months <= age);
        let lo = &rows[upper - 1];
        if lo.age_months == age || upper == rows.len() {
            return Ok(lo.lms);
        }
        let hi = &rows[upper];
        let t = (age - lo.age_months) / (hi.age_months - lo.age_months);
        Ok(lo.lms.lerp(&hi.lms, t))
    }

    /// Same as `lookup`, for callers working in days or weeks.
    pub fn lookup_age(&self, metric: Metric, sex: Sex, age: Age) -> Result<LmsParams, GrowthError> {
        self.lookup(metric, sex, age.months())
    }

    /// Grid rows for a series, ascending by age.
    pub fn grid(&self, metric: Metric, sex: Sex) -> &[ReferenceRow] {
        &self.series[slot(metric, sex)]
    }

    /// First and last grid ages of a series.
    pub fn grid_span(&self, metric: Metric, sex: Sex) -> (f64, f64) {
        let rows = self.grid(metric, sex);
        match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first.age_months, last.age_months),
            _ => (0.0, 0.0),
        }
    }

    /// Ages accepted by `lookup`, including the edge tolerance.
    pub fn supported_range(&self, metric: Metric, sex: Sex) -> (f64, f64) {
        let (first, last) = self.grid_span(metric, sex);
        (
            (first - self.edge_tolerance_months).max(0.0),
            last + self.edge_tolerance_months,
        )
    }

    pub fn resolution_months(&self) -> f64 {
        self.resolution_months
    }

    pub fn edge_tolerance_months(&self) -> f64 {
        self.edge_tolerance_months
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
