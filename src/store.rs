/// Growth record store for a single subject.
///
/// Records are kept in ascending timestamp order. The store is append-only:
/// nothing here edits or removes a stored record, and a correction enters
/// as a new record.
///
/// # Ordering policy
/// Manual data entry lags, so a record may be timestamped slightly before
/// the latest stored one. A record is accepted when
///
///   record.timestamp ≥ latest.timestamp − tolerance
///
/// and is then inserted at its chronological position (after any records
/// with an equal timestamp). Anything earlier is rejected with `OutOfOrder`
/// and the store is left unchanged. The tolerance comes from
/// `StoreConfig::out_of_order_tolerance_hours` (24 hours by default).

use crate::model::{GrowthError, MeasurementRecord, Metric, SubjectId};
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct GrowthRecordStore {
    subject_id: SubjectId,
    tolerance: Duration,
    records: Vec<MeasurementRecord>,
}

impl GrowthRecordStore {
    pub fn new(subject_id: SubjectId, tolerance: Duration) -> Self {
        GrowthRecordStore {
            subject_id,
            tolerance,
            records: Vec::new(),
        }
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Adds a record, enforcing the ordering policy.
    pub fn append(&mut self, record: MeasurementRecord) -> Result<(), GrowthError> {
        if record.subject_id != self.subject_id {
            return Err(GrowthError::InvalidMeasurement(format!(
                "record for subject {} offered to store of subject {}",
                record.subject_id, self.subject_id
            )));
        }

        if let Some(latest) = self.latest() {
            if record.timestamp < latest.timestamp - self.tolerance {
                return Err(GrowthError::OutOfOrder {
                    subject: self.subject_id.clone(),
                    timestamp: record.timestamp,
                    latest: latest.timestamp,
                });
            }
        }

        let position = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(position, record);
        Ok(())
    }

    /// All records, oldest first.
    pub fn all(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    /// Most recent record carrying a value for `metric`.
    pub fn latest_with(&self, metric: Metric) -> Option<&MeasurementRecord> {
        self.records.iter().rev().find(|r| r.value(metric).is_some())
    }

    /// Records carrying `metric`, oldest first, paired with the value.
    pub fn series(&self, metric: Metric) -> Vec<(&MeasurementRecord, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(metric).map(|v| (r, v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Age, RecordId};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    fn record(id: u64, timestamp: DateTime<Utc>, hc: Option<f64>) -> MeasurementRecord {
        MeasurementRecord {
            id: RecordId(id),
            subject_id: SubjectId::new("child-1"),
            timestamp,
            age: Age::from_days(id as f64),
            weight_kg: 5.0,
            height_cm: 60.0,
            head_circumference_cm: hc,
        }
    }

    fn store() -> GrowthRecordStore {
        GrowthRecordStore::new(SubjectId::new("child-1"), Duration::hours(24))
    }

    #[test]
    fn test_records_kept_in_timestamp_order() {
        let mut s = store();
        s.append(record(1, at(1, 9), None)).unwrap();
        s.append(record(2, at(10, 9), None)).unwrap();
        // Entered late, but within the 24h tolerance of the latest record.
        s.append(record(3, at(9, 20), None)).unwrap();
        let ids: Vec<u64> = s.all().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(s.latest().map(|r| r.id.0), Some(2));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let mut s = store();
        s.append(record(1, at(1, 9), None)).unwrap();
        s.append(record(2, at(1, 9), None)).unwrap();
        let ids: Vec<u64> = s.all().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2], "a correction with the same timestamp goes last");
    }

    #[test]
    fn test_record_exactly_at_tolerance_accepted() {
        let mut s = store();
        s.append(record(1, at(10, 9), None)).unwrap();
        assert!(s.append(record(2, at(9, 9), None)).is_ok());
    }

    #[test]
    fn test_record_beyond_tolerance_rejected_without_mutation() {
        let mut s = store();
        s.append(record(1, at(10, 9), None)).unwrap();
        let result = s.append(record(2, at(9, 8), None));
        assert!(
            matches!(result, Err(GrowthError::OutOfOrder { .. })),
            "25h inversion should be rejected, got {:?}",
            result
        );
        assert_eq!(s.len(), 1, "rejected append must not touch the store");
    }

    #[test]
    fn test_record_for_other_subject_rejected() {
        let mut s = store();
        let mut r = record(1, at(1, 9), None);
        r.subject_id = SubjectId::new("child-2");
        assert!(matches!(s.append(r), Err(GrowthError::InvalidMeasurement(_))));
        assert!(s.is_empty());
    }

    #[test]
    fn test_latest_with_skips_records_missing_metric() {
        let mut s = store();
        s.append(record(1, at(1, 9), Some(38.0))).unwrap();
        s.append(record(2, at(2, 9), None)).unwrap();
        assert_eq!(s.latest_with(Metric::HeadCircumference).map(|r| r.id.0), Some(1));
        assert_eq!(s.latest_with(Metric::Weight).map(|r| r.id.0), Some(2));
        assert_eq!(s.series(Metric::HeadCircumference).len(), 1);
    }
}
