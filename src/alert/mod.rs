//! Growth alert evaluation.
//!
//! Alerts are transient: they are recomputed from the ordered history on
//! every evaluation pass and never stored. Each rule lives in its own
//! module, reads only the history and configuration, and can be tested on
//! its own. Rules are additive; `evaluate` concatenates their output in a
//! fixed order so the same history always yields the same alert list.
//!
//! Rules:
//! - `thresholds` — latest percentile below the 3rd or above the 97th.
//! - `crossing`   — percentile moved across major centile lines.
//! - `stalls`     — non-positive weight or height velocity in infancy.
//! - `gaps`       — long gap between the two latest measurements.

pub mod crossing;
pub mod gaps;
pub mod stalls;
pub mod thresholds;

use crate::analysis::history::AssessedRecord;
use crate::config::{AlertConfig, VelocityConfig};
use crate::model::{Metric, RecordId};
use serde::Serialize;
use std::fmt;

/// Alert severity, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Informational,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Informational => write!(f, "informational"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Which rule produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ExtremeStanding,
    PercentileCrossing,
    StalledGrowth,
    MeasurementGap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthAlert {
    pub severity: Severity,
    pub kind: AlertKind,
    /// `None` only for alerts about measurement timing rather than a metric.
    pub metric: Option<Metric>,
    pub message: String,
    /// Records that triggered the alert, oldest first.
    pub records: Vec<RecordId>,
}

/// Runs every rule over `history`, which must be in ascending timestamp order.
pub fn evaluate(history: &[AssessedRecord], alerts: &AlertConfig, velocity: &VelocityConfig) -> Vec<GrowthAlert> {
    let mut out = Vec::new();
    out.extend(thresholds::check_extreme_standing(history));
    out.extend(crossing::check_percentile_crossing(history, alerts));
    out.extend(stalls::check_stalled_growth(history, alerts, velocity));
    out.extend(gaps::check_measurement_gap(history, alerts));
    out
}

/// English ordinal suffix for a rounded percentile ("1st", "12th", "23rd").
pub(crate) fn ordinal(percentile: f64) -> String {
    let n = percentile.round() as i64;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

// ---------------------------------------------------------------------------
// Test fixtures shared by the rule modules
// ---------------------------------------------------------------------------
