/// Growth percentile analytics for infants and young children.
///
/// Converts raw weight, height and head circumference measurements into
/// population-relative percentiles using WHO LMS reference tables, tracks
/// growth velocity per subject, and raises alerts when a child's
/// trajectory warrants attention.
///
/// Modules:
/// - `model`      — shared domain types and the `GrowthError` taxonomy.
/// - `reference`  — LMS reference table, embedded WHO dataset.
/// - `percentile` — z-score, percentile and category computation.
/// - `store`      — ordered measurement history for one subject.
/// - `analysis`   — velocity and per-record standings.
/// - `alert`      — alert rules over a subject's history.
/// - `service`    — `GrowthTracker`, the thread-safe entry point.
/// - `summary`    — serializable per-subject snapshot.
/// - `config`     — TOML configuration with environment overrides.
/// - `logging`    — component-tagged console and file logging.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod percentile;
pub mod reference;
pub mod service;
pub mod store;
pub mod summary;

pub use alert::{AlertKind, GrowthAlert, Severity};
pub use config::GrowthConfig;
pub use model::{
    Age, Category, GrowthError, GrowthRate, MeasurementRecord, Metric, RecordId, Sex, Standing, SubjectId,
    SubjectProfile,
};
pub use reference::ReferenceTable;
pub use service::GrowthTracker;
pub use summary::GrowthSummary;
