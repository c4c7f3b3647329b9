/// Per-subject snapshot for the presentation layer.
///
/// A summary never fails as a whole once the subject is known: a metric
/// that cannot be assessed carries the reason in its `*_unavailable` field
/// instead of a value, so the caller can show both side by side.

use crate::alert::GrowthAlert;
use crate::model::{GrowthError, GrowthRate, MeasurementRecord, Metric, Sex, Standing, SubjectId};
use serde::Serialize;

/// Trailing window for the rates shown in a summary.
pub const SUMMARY_RATE_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standing: Option<Standing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standing_unavailable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<GrowthRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_unavailable: Option<String>,
}

impl MetricSummary {
    pub fn from_results(
        metric: Metric,
        standing: Result<Standing, GrowthError>,
        rate: Result<GrowthRate, GrowthError>,
    ) -> Self {
        let (standing, standing_unavailable) = split(standing);
        let (rate, rate_unavailable) = split(rate);
        MetricSummary {
            metric,
            standing,
            standing_unavailable,
            rate,
            rate_unavailable,
        }
    }
}

fn split<T>(result: Result<T, GrowthError>) -> (Option<T>, Option<String>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub subject_id: SubjectId,
    pub sex: Sex,
    pub latest_record: Option<MeasurementRecord>,
    /// Age at the latest record.
    pub age_months: Option<f64>,
    /// One entry per metric, in `Metric::ALL` order.
    pub metrics: Vec<MetricSummary>,
    pub alerts: Vec<GrowthAlert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts_unavailable: Option<String>,
}

impl GrowthSummary {
    pub fn metric(&self, metric: Metric) -> Option<&MetricSummary> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, RecordId};

    fn standing() -> Standing {
        Standing {
            metric: Metric::Weight,
            percentile: 42.0,
            z_score: -0.2,
            category: Category::Normal,
        }
    }

    #[test]
    fn test_failed_rate_keeps_reason() {
        let summary = MetricSummary::from_results(
            Metric::Weight,
            Ok(standing()),
            Err(GrowthError::InsufficientData("only one weight".to_string())),
        );
        assert_eq!(summary.standing, Some(standing()));
        assert_eq!(summary.rate, None);
        assert_eq!(summary.rate_unavailable.as_deref(), Some("Insufficient data: only one weight"));
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let summary = GrowthSummary {
            subject_id: SubjectId::new("child-1"),
            sex: Sex::Female,
            latest_record: None,
            age_months: None,
            metrics: vec![MetricSummary::from_results(
                Metric::Weight,
                Ok(standing()),
                Ok(GrowthRate {
                    metric: Metric::Weight,
                    per_month: 0.9,
                    span_months: 1.0,
                    records_used: 2,
                    first_record: RecordId(1),
                    last_record: RecordId(2),
                }),
            )],
            alerts: Vec::new(),
            alerts_unavailable: None,
        };
        let json = summary.to_json().expect("summary serializes");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sex"], "female");
        assert_eq!(value["metrics"][0]["metric"], "weight");
        assert_eq!(value["metrics"][0]["standing"]["category"], "normal");
        assert!(value["metrics"][0].get("rate_unavailable").is_none());
        assert!(value.get("alerts_unavailable").is_none());
        assert!(summary.metric(Metric::Height).is_none());
    }
}
