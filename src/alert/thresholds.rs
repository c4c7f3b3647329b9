//! Extreme standing checking.
//!
//! Flags the latest standing of each metric when it falls outside the
//! 3rd-97th percentile band. Uses the same cut points as the percentile
//! categories, so an alert here always coincides with a `VeryLow` or
//! `VeryHigh` category.

use super::{ordinal, AlertKind, GrowthAlert, Severity};
use crate::analysis::history::AssessedRecord;
use crate::model::Metric;
use crate::percentile::{VERY_HIGH_ABOVE, VERY_LOW_BELOW};

/// Returns one warning per metric whose latest percentile is extreme.
///
/// Applies to a single record as well: no history is required.
pub fn check_extreme_standing(history: &[AssessedRecord]) -> Vec<GrowthAlert> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let latest = history.iter().rev().find(|a| a.standing(metric).is_some())?;
            let standing = latest.standing(metric)?;
            let side = if standing.percentile < VERY_LOW_BELOW {
                "below the 3rd"
            } else if standing.percentile > VERY_HIGH_ABOVE {
                "above the 97th"
            } else {
                return None;
            };
            Some(GrowthAlert {
                severity: Severity::Warning,
                kind: AlertKind::ExtremeStanding,
                metric: Some(metric),
                message: format!(
                    "{} is at the {} percentile ({}), {} percentile",
                    capitalize(&metric.to_string()),
                    ordinal(standing.percentile),
                    standing.category.label(metric),
                    side
                ),
                records: vec![latest.record.id],
            })
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
