//! Measurement gap detection.
//!
//! Velocity computed across a long gap hides what happened in between.
//! When the two latest measurements of an infant are further apart than
//! `AlertConfig::max_measurement_gap_days`, an informational alert notes
//! that the trend is less reliable.

use super::{AlertKind, GrowthAlert, Severity};
use crate::analysis::history::AssessedRecord;
use crate::config::AlertConfig;
use crate::model::days_between;

pub fn check_measurement_gap(history: &[AssessedRecord], config: &AlertConfig) -> Option<GrowthAlert> {
    let [.., previous, latest] = history else {
        return None;
    };
    if latest.record.age.months() > config.stall_max_age_months {
        return None;
    }
    let gap_days = days_between(previous.record.timestamp, latest.record.timestamp);
    if gap_days <= f64::from(config.max_measurement_gap_days) {
        return None;
    }
    Some(GrowthAlert {
        severity: Severity::Informational,
        kind: AlertKind::MeasurementGap,
        metric: None,
        message: format!(
            "{:.0} days between the last two measurements; growth trends across this gap are less reliable",
            gap_days
        ),
        records: vec![previous.record.id, latest.record.id],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::fixtures::entry;

    #[test]
    fn test_regular_checkups_raise_nothing() {
        let history = vec![
            entry(1, 0.0, (3.3, 50.0), (50.0, 50.0)),
            entry(2, 2.0, (5.6, 50.0), (58.4, 50.0)),
        ];
        assert!(check_measurement_gap(&history, &AlertConfig::default()).is_none());
    }

    #[test]
    fn test_long_gap_is_informational() {
        let history = vec![
            entry(1, 2.0, (5.6, 50.0), (58.4, 50.0)),
            entry(2, 6.0, (7.9, 50.0), (67.6, 50.0)),
        ];
        let alert = check_measurement_gap(&history, &AlertConfig::default()).expect("122-day gap");
        assert_eq!(alert.severity, Severity::Informational);
        assert_eq!(alert.metric, None);
        assert!(alert.message.starts_with("122 days"), "got {}", alert.message);
    }

    #[test]
    fn test_single_record_raises_nothing() {
        let history = vec![entry(1, 2.0, (5.6, 50.0), (58.4, 50.0))];
        assert!(check_measurement_gap(&history, &AlertConfig::default()).is_none());
    }
}
