//! Percentile crossing detection.
//!
//! A child tracking along one centile is expected; drifting across several
//! major centile lines over a short run of measurements is a clinical
//! concern even when the absolute standing is still normal.
//!
//! The latest percentile is compared with the one `crossing_lookback_records`
//! measurements earlier. A history with fewer measurements of the metric
//! than that raises nothing. The number of major centile lines between the two is compared
//! with the per-metric threshold in `AlertConfig::crossing_lines`.

use super::{ordinal, AlertKind, GrowthAlert, Severity};
use crate::analysis::history::{percentile_series, AssessedRecord};
use crate::config::AlertConfig;
use crate::model::Metric;

/// Major centile lines of the growth charts.
pub const MAJOR_CENTILE_LINES: [f64; 7] = [3.0, 10.0, 25.0, 50.0, 75.0, 90.0, 97.0];

/// Number of major centile lines strictly below `percentile`.
fn band(percentile: f64) -> usize {
    MAJOR_CENTILE_LINES.iter().filter(|&&line| line < percentile).count()
}

/// Major centile lines lying between two percentiles.
pub fn lines_crossed(from: f64, to: f64) -> u32 {
    band(from).abs_diff(band(to)) as u32
}

pub fn check_percentile_crossing(history: &[AssessedRecord], config: &AlertConfig) -> Vec<GrowthAlert> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let series = percentile_series(history, metric);
            let lookback = config.crossing_lookback_records;
            if series.len() <= lookback {
                return None;
            }
            let (latest_id, latest) = series[series.len() - 1];
            let (prior_id, prior) = series[series.len() - 1 - lookback];

            let crossed = lines_crossed(prior, latest);
            if crossed < config.crossing_lines.for_metric(metric) {
                return None;
            }
            let direction = if latest < prior { "dropped" } else { "rose" };
            Some(GrowthAlert {
                severity: Severity::Warning,
                kind: AlertKind::PercentileCrossing,
                metric: Some(metric),
                message: format!(
                    "{} {} from the {} to the {} percentile, crossing {} major centile lines",
                    metric,
                    direction,
                    ordinal(prior),
                    ordinal(latest),
                    crossed
                ),
                records: vec![prior_id, latest_id],
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::fixtures::{entry, with_head};
    use crate::model::RecordId;

    #[test]
    fn test_lines_crossed_counts_lines_between() {
        assert_eq!(lines_crossed(50.0, 50.0), 0);
        assert_eq!(lines_crossed(60.0, 55.0), 0);
        assert_eq!(lines_crossed(50.0, 8.0), 2, "50th to below 10th crosses the 25th and 10th");
        assert_eq!(lines_crossed(8.0, 50.0), 2, "crossing is symmetric");
        assert_eq!(lines_crossed(60.0, 5.0), 3);
        assert_eq!(lines_crossed(1.0, 99.0), 7);
    }

    #[test]
    fn test_drop_across_three_lines_warns() {
        let history = vec![
            entry(1, 0.0, (3.5, 60.0), (50.0, 50.0)),
            entry(2, 1.0, (4.4, 45.0), (54.0, 50.0)),
            entry(3, 2.0, (5.0, 20.0), (58.0, 50.0)),
            entry(4, 3.0, (5.3, 5.0), (61.0, 50.0)),
        ];
        let alerts = check_percentile_crossing(&history, &AlertConfig::default());
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.metric, Some(Metric::Weight));
        assert_eq!(alert.severity, Severity::Warning);
        // Compared with the record two measurements earlier.
        assert_eq!(alert.records, vec![RecordId(2), RecordId(4)]);
        assert_eq!(
            alert.message,
            "weight dropped from the 45th to the 5th percentile, crossing 2 major centile lines"
        );
    }

    #[test]
    fn test_steady_tracking_raises_nothing() {
        let history = vec![
            entry(1, 0.0, (3.5, 40.0), (50.0, 60.0)),
            entry(2, 1.0, (4.5, 45.0), (54.0, 55.0)),
            entry(3, 2.0, (5.6, 42.0), (58.0, 62.0)),
        ];
        assert!(check_percentile_crossing(&history, &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_single_record_raises_nothing() {
        let history = vec![entry(1, 0.0, (3.5, 90.0), (50.0, 50.0))];
        assert!(check_percentile_crossing(&history, &AlertConfig::default()).is_empty());
    }

    #[test]
    fn test_history_shorter_than_lookback_raises_nothing() {
        let history = vec![
            entry(1, 0.0, (3.5, 50.0), (50.0, 50.0)),
            entry(2, 1.0, (5.5, 95.0), (54.0, 50.0)),
        ];
        assert!(
            check_percentile_crossing(&history, &AlertConfig::default()).is_empty(),
            "no record two measurements before the latest"
        );

        let mut config = AlertConfig::default();
        config.crossing_lookback_records = 1;
        let alerts = check_percentile_crossing(&history, &config);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.starts_with("weight rose from the 50th to the 95th"));
    }

    #[test]
    fn test_threshold_is_per_metric() {
        let history = vec![
            with_head(entry(1, 0.0, (3.5, 50.0), (50.0, 50.0)), 34.0, 50.0),
            with_head(entry(2, 1.0, (4.5, 50.0), (54.0, 50.0)), 36.5, 40.0),
            with_head(entry(3, 2.0, (5.6, 50.0), (58.0, 50.0)), 38.3, 20.0),
        ];
        // One line crossed (the 25th): below the default, above a threshold of 1.
        assert!(check_percentile_crossing(&history, &AlertConfig::default()).is_empty());

        let mut config = AlertConfig::default();
        config.crossing_lines.head_circumference = 1;
        let alerts = check_percentile_crossing(&history, &config);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Some(Metric::HeadCircumference));
    }
}
