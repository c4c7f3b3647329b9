/// Growth velocity over a trailing window.
///
/// The window is anchored at the latest record carrying the metric and
/// reaches back `window_days`. Selection:
///
///   1. every record inside the window, plus
///   2. the nearest record before the window start, when it lies no more
///      than `VelocityConfig::window_slack_days` before it, so monthly
///      visits against a 30- or 60-day window still span the whole window;
///   3. if that still leaves fewer than two records, the two most recent.
///
/// Records further back than the slack never take part while two records
/// sit inside the window.
///
/// The rate is `(last − first) / months_between(first, last)` over the
/// selection. It is never defaulted: fewer than two records, or a span
/// shorter than `min_span_days`, fails with `InsufficientData`.

use crate::config::VelocityConfig;
use crate::model::{days_between, months_between, GrowthError, GrowthRate, MeasurementRecord, Metric};
use chrono::Duration;

/// Growth rate of `metric` in units per month.
///
/// `records` must be in ascending timestamp order, as returned by the store.
pub fn growth_rate<'a, I>(
    records: I,
    metric: Metric,
    window_days: u32,
    config: &VelocityConfig,
) -> Result<GrowthRate, GrowthError>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let points: Vec<(&MeasurementRecord, f64)> = records
        .into_iter()
        .filter_map(|r| r.value(metric).map(|v| (r, v)))
        .collect();

    if points.len() < 2 {
        return Err(GrowthError::InsufficientData(format!(
            "a {} rate needs at least two measurements, have {}",
            metric,
            points.len()
        )));
    }

    let (latest, last_value) = points[points.len() - 1];
    let window_start = latest.timestamp - Duration::days(i64::from(window_days));

    // First record inside the window.
    let inside = points.partition_point(|(r, _)| r.timestamp < window_start);
    let bounded = inside > 0
        && days_between(points[inside - 1].0.timestamp, window_start) <= config.window_slack_days;
    let start = (if bounded { inside - 1 } else { inside }).min(points.len() - 2);

    let (first, first_value) = points[start];
    let span_days = days_between(first.timestamp, latest.timestamp);
    if span_days < config.min_span_days {
        return Err(GrowthError::InsufficientData(format!(
            "{} measurements span {:.2} days, need at least {}",
            metric, span_days, config.min_span_days
        )));
    }

    let span_months = months_between(first.timestamp, latest.timestamp);
    Ok(GrowthRate {
        metric,
        per_month: (last_value - first_value) / span_months,
        span_months,
        records_used: points.len() - start,
        first_record: first.id,
        last_record: latest.id,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
