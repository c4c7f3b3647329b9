/// A subject's ordered history with the standing of every record.
///
/// This is the input of the alert evaluator. Standings are computed once
/// per record and metric; the tracking service supplies them from its
/// memo cache through `AssessedRecord::build`.

use crate::model::{GrowthError, MeasurementRecord, Metric, RecordId, Sex, Standing};
use crate::percentile::compute_standing;
use crate::reference::ReferenceTable;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessedRecord {
    pub record: MeasurementRecord,
    pub weight: Standing,
    pub height: Standing,
    pub head_circumference: Option<Standing>,
}

impl AssessedRecord {
    /// Pairs `record` with standings obtained from `standing_of`, which is
    /// called once per metric the record carries.
    pub fn build<F>(record: MeasurementRecord, mut standing_of: F) -> Result<Self, GrowthError>
    where
        F: FnMut(&MeasurementRecord, Metric, f64) -> Result<Standing, GrowthError>,
    {
        let weight = standing_of(&record, Metric::Weight, record.weight_kg)?;
        let height = standing_of(&record, Metric::Height, record.height_cm)?;
        let head_circumference = match record.head_circumference_cm {
            Some(hc) => Some(standing_of(&record, Metric::HeadCircumference, hc)?),
            None => None,
        };
        Ok(AssessedRecord {
            record,
            weight,
            height,
            head_circumference,
        })
    }

    /// Computes standings directly from the reference table.
    pub fn assess(table: &ReferenceTable, sex: Sex, record: MeasurementRecord) -> Result<Self, GrowthError> {
        Self::build(record, |r, metric, value| compute_standing(table, metric, sex, r.age, value))
    }

    pub fn standing(&self, metric: Metric) -> Option<&Standing> {
        match metric {
            Metric::Weight => Some(&self.weight),
            Metric::Height => Some(&self.height),
            Metric::HeadCircumference => self.head_circumference.as_ref(),
        }
    }
}

/// Percentiles of `metric` across the history, oldest first, skipping
/// records that do not carry the metric.
pub fn percentile_series(history: &[AssessedRecord], metric: Metric) -> Vec<(RecordId, f64)> {
    history
        .iter()
        .filter_map(|a| a.standing(metric).map(|s| (a.record.id, s.percentile)))
        .collect()
}
