/// Time-series analysis over a subject's ordered measurement history.
///
/// Submodules:
/// - `velocity` — growth rate of a metric over a trailing window.
/// - `history`  — records paired with their computed standings.

pub mod history;
pub mod velocity;
