//! Stalled growth detection.
//!
//! Weight and length are expected to increase continuously in infancy, so
//! a non-positive velocity over the configured window is flagged, whatever
//! the percentile. The rule only applies while the latest measurement is
//! at or below `AlertConfig::stall_max_age_months`.

use super::{AlertKind, GrowthAlert, Severity};
use crate::analysis::history::AssessedRecord;
use crate::analysis::velocity::growth_rate;
use crate::config::{AlertConfig, VelocityConfig};
use crate::model::Metric;

const STALL_METRICS: [Metric; 2] = [Metric::Weight, Metric::Height];

pub fn check_stalled_growth(
    history: &[AssessedRecord],
    config: &AlertConfig,
    velocity: &VelocityConfig,
) -> Vec<GrowthAlert> {
    let Some(latest) = history.last() else {
        return Vec::new();
    };
    if latest.record.age.months() > config.stall_max_age_months {
        return Vec::new();
    }

    STALL_METRICS
        .iter()
        .filter_map(|&metric| {
            // Too few records or too short a span: the rule does not apply.
            let rate = growth_rate(
                history.iter().map(|a| &a.record),
                metric,
                config.stall_window_days,
                velocity,
            )
            .ok()?;
            if rate.per_month > 0.0 {
                return None;
            }
            Some(GrowthAlert {
                severity: Severity::Warning,
                kind: AlertKind::StalledGrowth,
                metric: Some(metric),
                message: format!(
                    "{} has not increased over {:.1} months ({:+.2} {}/month)",
                    metric,
                    rate.span_months,
                    rate.per_month,
                    metric.unit()
                ),
                records: vec![rate.first_record, rate.last_record],
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
