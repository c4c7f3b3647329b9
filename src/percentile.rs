//! Percentile calculator.
//!
//! Converts an absolute measurement into a z-score with the LMS
//! transformation, then into a percentile through the standard normal CDF.
//! This is the only place in the crate that evaluates the LMS formula.
//!
//! # Determinism
//! Every function here is pure. Identical inputs produce bit-identical
//! outputs; the tracking service memoizes standings per record.

use crate::model::{validate_value, Age, Category, GrowthError, Metric, Sex, Standing};
use crate::reference::{LmsParams, ReferenceTable};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

// ---------------------------------------------------------------------------
// Category cut points
// ---------------------------------------------------------------------------

/// Percentiles strictly below this are `Category::VeryLow`.
pub const VERY_LOW_BELOW: f64 = 3.0;

/// Percentiles at or above this (and not above `VERY_HIGH_ABOVE`) are `Category::High`.
pub const HIGH_FROM: f64 = 85.0;

/// Percentiles strictly above this are `Category::VeryHigh`.
pub const VERY_HIGH_ABOVE: f64 = 97.0;

/// |L| below this is treated as L = 0 (log branch of the LMS transform).
const L_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// LMS transform
// ---------------------------------------------------------------------------

/// Standardized score of `value` under the given LMS parameters.
///
///   L ≈ 0:  Z = ln(v / M) / S
///   else:   Z = ((v / M)^L − 1) / (L · S)
pub fn z_score(lms: &LmsParams, value: f64) -> f64 {
    let ratio = value / lms.m;
    if lms.l.abs() < L_EPSILON {
        ratio.ln() / lms.s
    } else {
        (ratio.powf(lms.l) - 1.0) / (lms.l * lms.s)
    }
}

/// Measurement that sits exactly at `z` under the given LMS parameters.
///
/// Returns `None` when the z-score lies beyond the distribution's support
/// (possible for strongly skewed series at extreme z).
pub fn value_at_z(lms: &LmsParams, z: f64) -> Option<f64> {
    let value = if lms.l.abs() < L_EPSILON {
        lms.m * (lms.s * z).exp()
    } else {
        let base = 1.0 + lms.l * lms.s * z;
        if base <= 0.0 {
            return None;
        }
        lms.m * base.powf(1.0 / lms.l)
    };
    value.is_finite().then_some(value)
}

/// Percent of the standard normal population at or below `z`, clamped to [0, 100].
pub fn percentile_from_z(z: f64) -> f64 {
    (50.0 * erfc(-z / SQRT_2)).clamp(0.0, 100.0)
}

/// Qualitative band for a percentile. See `Category` for the cut points.
pub fn category_for(percentile: f64) -> Category {
    if percentile < VERY_LOW_BELOW {
        Category::VeryLow
    } else if percentile < HIGH_FROM {
        Category::Normal
    } else if percentile <= VERY_HIGH_ABOVE {
        Category::High
    } else {
        Category::VeryHigh
    }
}

// ---------------------------------------------------------------------------
// Standing
// ---------------------------------------------------------------------------

/// Population-relative standing of `value` for a subject of `sex` at `age`.
///
/// Fails with `InvalidMeasurement` for a non-positive or non-finite value
/// and with `OutOfRange` when the age is outside the reference table.
/// Extreme but valid values are clamped to percentile 0 or 100 rather than
/// rejected.
pub fn compute_standing(
    table: &ReferenceTable,
    metric: Metric,
    sex: Sex,
    age: Age,
    value: f64,
) -> Result<Standing, GrowthError> {
    validate_value(metric, value)?;
    let lms = table.lookup_age(metric, sex, age)?;
    let z = z_score(&lms, value);
    if z.is_nan() {
        return Err(GrowthError::InvalidMeasurement(format!(
            "{} of {} has no defined z-score",
            metric, value
        )));
    }
    let percentile = percentile_from_z(z);
    Ok(Standing {
        metric,
        percentile,
        z_score: z,
        category: category_for(percentile),
    })
}

/// Reference value at `z` for plotting percentile curves.
pub fn reference_value(
    table: &ReferenceTable,
    metric: Metric,
    sex: Sex,
    age: Age,
    z: f64,
) -> Result<Option<f64>, GrowthError> {
    let lms = table.lookup_age(metric, sex, age)?;
    Ok(value_at_z(&lms, z))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
