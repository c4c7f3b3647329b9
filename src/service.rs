//! Growth tracking service.
//!
//! Orchestrates the record store, percentile calculator, velocity analysis
//! and alert rules for any number of subjects. Every operation is
//! synchronous and performs no I/O once the reference table is loaded.
//!
//! # Concurrency
//! Subjects are held in a map of per-subject `RwLock`s. The map lock is only
//! held long enough to find or insert a subject entry, so work on one
//! subject never blocks another. Writes for a subject take its write lock,
//! which serialises the ordering check against the cache invalidation.
//! Reads take its read lock and may run concurrently. The reference table
//! is immutable and shared through an `Arc` without locking.
//!
//! # Standing cache
//! Standings are memoized per (record, metric). A record never changes
//! once stored, so the memo is exact; it is still cleared for the subject
//! on every write.

use crate::alert::{self, GrowthAlert, Severity};
use crate::analysis::history::AssessedRecord;
use crate::analysis::velocity;
use crate::config::GrowthConfig;
use crate::logging::{self, Component};
use crate::model::{
    Age, GrowthError, GrowthRate, MeasurementRecord, Metric, RecordId, Standing, SubjectId,
    SubjectProfile,
};
use crate::percentile::compute_standing;
use crate::reference::{ReferenceError, ReferenceTable};
use crate::store::GrowthRecordStore;
use crate::summary::{GrowthSummary, MetricSummary, SUMMARY_RATE_WINDOW_DAYS};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

struct SubjectState {
    profile: SubjectProfile,
    store: GrowthRecordStore,
    standings: Mutex<HashMap<(RecordId, Metric), Standing>>,
}

pub struct GrowthTracker {
    reference: Arc<ReferenceTable>,
    config: GrowthConfig,
    subjects: RwLock<HashMap<SubjectId, Arc<RwLock<SubjectState>>>>,
    next_record_id: AtomicU64,
}

impl GrowthTracker {
    pub fn new(reference: Arc<ReferenceTable>, config: GrowthConfig) -> Self {
        GrowthTracker {
            reference,
            config,
            subjects: RwLock::new(HashMap::new()),
            next_record_id: AtomicU64::new(1),
        }
    }

    /// Tracker backed by the embedded WHO reference table.
    pub fn with_embedded_reference(config: GrowthConfig) -> Result<Self, ReferenceError> {
        Ok(Self::new(Arc::new(ReferenceTable::embedded()?), config))
    }

    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Subjects
    // -----------------------------------------------------------------------

    /// Registers the sex and birth time of a subject.
    ///
    /// Registering the same profile again is a no-op; a different profile
    /// for a known subject fails with `ProfileConflict`.
    pub fn register_subject(&self, profile: SubjectProfile) -> Result<(), GrowthError> {
        let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = subjects.get(&profile.id) {
            let state = existing.read().unwrap_or_else(PoisonError::into_inner);
            if state.profile == profile {
                return Ok(());
            }
            let err = GrowthError::ProfileConflict(profile.id.clone());
            logging::log_rejection(&profile.id, "register_subject", &err);
            return Err(err);
        }

        let tolerance = Duration::hours(i64::from(self.config.store.out_of_order_tolerance_hours));
        let state = SubjectState {
            store: GrowthRecordStore::new(profile.id.clone(), tolerance),
            standings: Mutex::new(HashMap::new()),
            profile: profile.clone(),
        };
        logging::debug(
            Component::Service,
            Some(&profile.id),
            &format!("Registered {} subject born {}", profile.sex, profile.birth.to_rfc3339()),
        );
        subjects.insert(profile.id, Arc::new(RwLock::new(state)));
        Ok(())
    }

    fn subject(&self, subject_id: &SubjectId) -> Result<Arc<RwLock<SubjectState>>, GrowthError> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects
            .get(subject_id)
            .cloned()
            .ok_or_else(|| GrowthError::UnknownSubject(subject_id.clone()))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Stores a new measurement and returns its record id.
    pub fn record_measurement(
        &self,
        subject_id: &SubjectId,
        timestamp: DateTime<Utc>,
        weight_kg: f64,
        height_cm: f64,
        head_circumference_cm: Option<f64>,
    ) -> Result<RecordId, GrowthError> {
        let result = self
            .subject(subject_id)
            .and_then(|state| {
                let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
                let record = MeasurementRecord {
                    id: RecordId(self.next_record_id.fetch_add(1, Ordering::Relaxed)),
                    subject_id: subject_id.clone(),
                    timestamp,
                    age: Age::between(state.profile.birth, timestamp),
                    weight_kg,
                    height_cm,
                    head_circumference_cm,
                };
                record.validate()?;
                let id = record.id;
                state.store.append(record)?;
                state
                    .standings
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clear();
                Ok(id)
            });

        match &result {
            Ok(id) => logging::debug(
                Component::Store,
                Some(subject_id),
                &format!("Stored record {} taken {}", id, timestamp.to_rfc3339()),
            ),
            Err(err) => logging::log_rejection(subject_id, "record_measurement", err),
        }
        result
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All records of a subject, oldest first.
    pub fn all_for(&self, subject_id: &SubjectId) -> Result<Vec<MeasurementRecord>, GrowthError> {
        let state = self.subject(subject_id)?;
        let state = state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.store.all().to_vec())
    }

    pub fn latest_for(&self, subject_id: &SubjectId) -> Result<Option<MeasurementRecord>, GrowthError> {
        let state = self.subject(subject_id)?;
        let state = state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.store.latest().cloned())
    }

    /// Standing of the latest record carrying `metric`.
    pub fn current_standing(&self, subject_id: &SubjectId, metric: Metric) -> Result<Standing, GrowthError> {
        self.read(subject_id, "current_standing", |state| self.standing_in(state, metric))
    }

    /// Rate of change of `metric` over the trailing `window_days`, per month.
    pub fn growth_rate(
        &self,
        subject_id: &SubjectId,
        metric: Metric,
        window_days: u32,
    ) -> Result<GrowthRate, GrowthError> {
        self.read(subject_id, "growth_rate", |state| self.rate_in(state, metric, window_days))
    }

    /// Every record paired with its standings, oldest first.
    pub fn history(&self, subject_id: &SubjectId) -> Result<Vec<AssessedRecord>, GrowthError> {
        self.read(subject_id, "history", |state| self.assess_all(state))
    }

    /// Alerts raised by the full history of the subject.
    pub fn active_alerts(&self, subject_id: &SubjectId) -> Result<Vec<GrowthAlert>, GrowthError> {
        self.read(subject_id, "active_alerts", |state| self.alerts_in(state))
    }

    /// Snapshot of standing, velocity and alerts for the presentation layer.
    ///
    /// Everything is computed under one read lock, so the snapshot reflects
    /// a single version of the history. Metrics that cannot be computed
    /// carry the reason instead of a value.
    pub fn summary(&self, subject_id: &SubjectId) -> Result<GrowthSummary, GrowthError> {
        self.read(subject_id, "summary", |state| {
            let latest = state.store.latest().cloned();
            let metrics = Metric::ALL
                .iter()
                .map(|&metric| {
                    MetricSummary::from_results(
                        metric,
                        self.standing_in(state, metric),
                        self.rate_in(state, metric, SUMMARY_RATE_WINDOW_DAYS),
                    )
                })
                .collect();

            let (alerts, alerts_unavailable) = match self.alerts_in(state) {
                Ok(alerts) => (alerts, None),
                Err(err) => (Vec::new(), Some(err.to_string())),
            };

            Ok(GrowthSummary {
                subject_id: subject_id.clone(),
                sex: state.profile.sex,
                age_months: latest.as_ref().map(|r| r.age.months()),
                latest_record: latest,
                metrics,
                alerts,
                alerts_unavailable,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn read<T, F>(&self, subject_id: &SubjectId, operation: &str, f: F) -> Result<T, GrowthError>
    where
        F: FnOnce(&SubjectState) -> Result<T, GrowthError>,
    {
        let result = self.subject(subject_id).and_then(|state| {
            let state = state.read().unwrap_or_else(PoisonError::into_inner);
            f(&state)
        });
        if let Err(err) = &result {
            logging::log_rejection(subject_id, operation, err);
        }
        result
    }

    fn standing_in(&self, state: &SubjectState, metric: Metric) -> Result<Standing, GrowthError> {
        let record = state.store.latest_with(metric).ok_or_else(|| GrowthError::NoData {
            subject: state.profile.id.clone(),
            metric,
        })?;
        let value = record.value(metric).ok_or_else(|| GrowthError::NoData {
            subject: state.profile.id.clone(),
            metric,
        })?;
        self.memoized_standing(state, record, metric, value)
    }

    fn rate_in(&self, state: &SubjectState, metric: Metric, window_days: u32) -> Result<GrowthRate, GrowthError> {
        velocity::growth_rate(state.store.all(), metric, window_days, &self.config.velocity)
    }

    fn alerts_in(&self, state: &SubjectState) -> Result<Vec<GrowthAlert>, GrowthError> {
        let history = self.assess_all(state)?;
        let alerts = alert::evaluate(&history, &self.config.alerts, &self.config.velocity);
        let warnings = alerts.iter().filter(|a| a.severity == Severity::Warning).count();
        logging::log_alert_summary(&state.profile.id, history.len(), warnings, alerts.len() - warnings);
        Ok(alerts)
    }

    /// Lookup and insert take the cache lock separately. Callers hold the
    /// subject read lock, which keeps a writer from clearing in between.
    fn memoized_standing(
        &self,
        state: &SubjectState,
        record: &MeasurementRecord,
        metric: Metric,
        value: f64,
    ) -> Result<Standing, GrowthError> {
        let key = (record.id, metric);
        let cached = state
            .standings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied();
        if let Some(standing) = cached {
            return Ok(standing);
        }
        let standing = compute_standing(&self.reference, metric, state.profile.sex, record.age, value)?;
        state
            .standings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, standing);
        Ok(standing)
    }

    fn assess_all(&self, state: &SubjectState) -> Result<Vec<AssessedRecord>, GrowthError> {
        state
            .store
            .all()
            .iter()
            .map(|record| {
                AssessedRecord::build(record.clone(), |r, metric, value| {
                    self.memoized_standing(state, r, metric, value)
                })
            })
            .collect()
    }

    #[cfg(test)]
    fn cached_standings(&self, subject_id: &SubjectId) -> usize {
        self.subject(subject_id)
            .map(|state| {
                let state = state.read().unwrap_or_else(PoisonError::into_inner);
                let count = state.standings.lock().unwrap_or_else(PoisonError::into_inner).len();
                count
            })
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
