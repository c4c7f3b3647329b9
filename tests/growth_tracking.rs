/// End-to-end tests for the growth tracking service
///
/// Tests verify:
/// 1. Velocity across a short monthly history
/// 2. A single record never produces trend alerts
/// 3. A falling weight trajectory raises a percentile crossing warning
/// 4. Rejected writes leave the history unchanged
/// 5. Summaries serialize with the unavailable metrics explained
///
/// Everything runs in-process against the embedded WHO reference table.

use chrono::{DateTime, Duration, TimeZone, Utc};
use growth_monitor::{
    AlertKind, Category, GrowthConfig, GrowthError, GrowthTracker, Metric, Severity, Sex, SubjectId,
    SubjectProfile,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Seconds in one average month (30.4375 days).
const SECONDS_PER_MONTH: i64 = 2_629_800;

fn birth() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 6, 0, 0).unwrap()
}

fn at_months(months: i64) -> DateTime<Utc> {
    birth() + Duration::seconds(months * SECONDS_PER_MONTH)
}

fn tracker() -> GrowthTracker {
    GrowthTracker::with_embedded_reference(GrowthConfig::default()).expect("embedded reference table should load")
}

fn register(tracker: &GrowthTracker, name: &str, sex: Sex) -> SubjectId {
    let id = SubjectId::new(name);
    tracker
        .register_subject(SubjectProfile {
            id: id.clone(),
            sex,
            birth: birth(),
        })
        .expect("first registration succeeds");
    id
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_weight_velocity_over_first_two_months() {
    let tracker = tracker();
    let id = register(&tracker, "infant-a", Sex::Male);
    for (month, weight, height) in [(0, 3.3, 49.9), (1, 4.5, 54.7), (2, 5.6, 58.4)] {
        tracker
            .record_measurement(&id, at_months(month), weight, height, None)
            .expect("monthly measurement accepted");
    }

    let rate = tracker.growth_rate(&id, Metric::Weight, 60).unwrap();
    assert!(
        (rate.per_month - 1.15).abs() < 1e-9,
        "(5.6 - 3.3) kg over two months should be 1.15 kg/month, got {}",
        rate.per_month
    );
    assert_eq!(rate.records_used, 3);

    let standing = tracker.current_standing(&id, Metric::Weight).unwrap();
    assert_eq!(standing.category, Category::Normal);
    assert!((40.0..60.0).contains(&standing.percentile), "got {}", standing.percentile);
}

#[test]
fn test_single_record_has_no_trend_alerts() {
    let tracker = tracker();
    let id = register(&tracker, "infant-b", Sex::Female);
    tracker.record_measurement(&id, at_months(1), 4.2, 53.7, Some(36.5)).unwrap();

    let alerts = tracker.active_alerts(&id).unwrap();
    assert!(
        alerts
            .iter()
            .all(|a| a.kind != AlertKind::PercentileCrossing && a.kind != AlertKind::StalledGrowth),
        "one record cannot show a trend, got {:?}",
        alerts
    );
    assert!(matches!(
        tracker.growth_rate(&id, Metric::Weight, 30),
        Err(GrowthError::InsufficientData(_))
    ));
}

#[test]
fn test_falling_weight_raises_crossing_warning() {
    let tracker = tracker();
    let id = register(&tracker, "infant-c", Sex::Male);
    let visits = [(0, 3.47, 49.9), (1, 4.4, 54.7), (2, 5.2, 58.4), (3, 5.24, 61.4)];
    for (month, weight, height) in visits {
        tracker.record_measurement(&id, at_months(month), weight, height, None).unwrap();
    }

    let alerts = tracker.active_alerts(&id).unwrap();
    let crossing: Vec<_> = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::PercentileCrossing)
        .collect();
    assert_eq!(crossing.len(), 1, "only weight drifts, got {:?}", alerts);
    let alert = crossing[0];
    assert_eq!(alert.severity, Severity::Warning);
    assert_eq!(alert.metric, Some(Metric::Weight));
    assert_eq!(
        alert.message,
        "weight dropped from the 45th to the 5th percentile, crossing 2 major centile lines"
    );

    let history = tracker.history(&id).unwrap();
    assert_eq!(alert.records, vec![history[1].record.id, history[3].record.id]);
    assert!(history[0].weight.percentile > 55.0);
    assert!(history[3].weight.percentile < 6.0);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn test_late_record_rejected_and_history_unchanged() {
    let tracker = tracker();
    let id = register(&tracker, "infant-d", Sex::Female);
    tracker.record_measurement(&id, at_months(2), 5.1, 57.1, None).unwrap();
    let before = tracker.all_for(&id).unwrap();

    let late = tracker.record_measurement(&id, at_months(1), 4.2, 53.7, None);
    assert!(matches!(late, Err(GrowthError::OutOfOrder { .. })), "got {:?}", late);
    assert_eq!(tracker.all_for(&id).unwrap(), before);
}

#[test]
fn test_record_within_tolerance_is_inserted_in_order() {
    let tracker = tracker();
    let id = register(&tracker, "infant-e", Sex::Female);
    tracker.record_measurement(&id, at_months(2), 5.1, 57.1, None).unwrap();
    let earlier = at_months(2) - Duration::hours(6);
    tracker.record_measurement(&id, earlier, 5.1, 57.0, None).unwrap();

    let records = tracker.all_for(&id).unwrap();
    assert_eq!(records[0].timestamp, earlier);
    assert_eq!(tracker.latest_for(&id).unwrap().map(|r| r.timestamp), Some(at_months(2)));
}

#[test]
fn test_age_past_reference_range_is_out_of_range() {
    let tracker = tracker();
    let id = register(&tracker, "toddler", Sex::Male);
    tracker.record_measurement(&id, at_months(36), 14.3, 96.1, None).unwrap();
    assert!(matches!(
        tracker.current_standing(&id, Metric::Weight),
        Err(GrowthError::OutOfRange { .. })
    ));
}

#[test]
fn test_extreme_value_clamped_to_percentile_range() {
    let tracker = tracker();
    let id = register(&tracker, "infant-f", Sex::Male);
    tracker.record_measurement(&id, at_months(1), 30.0, 54.7, None).unwrap();
    let standing = tracker.current_standing(&id, Metric::Weight).unwrap();
    assert!(standing.percentile <= 100.0 && standing.percentile > 99.9);
    assert_eq!(standing.category, Category::VeryHigh);
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[test]
fn test_summary_json_explains_missing_head_circumference() {
    let tracker = tracker();
    let id = register(&tracker, "infant-g", Sex::Female);
    tracker.record_measurement(&id, at_months(0), 3.2, 49.1, None).unwrap();
    tracker.record_measurement(&id, at_months(1), 4.2, 53.7, None).unwrap();

    let summary = tracker.summary(&id).unwrap();
    let json = summary.to_json().expect("summary serializes");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["subject_id"], "infant-g");
    assert_eq!(value["metrics"][0]["metric"], "weight");
    assert!(value["metrics"][0]["rate"]["per_month"].as_f64().unwrap() > 0.9);
    let head = &value["metrics"][2];
    assert_eq!(head["metric"], "head_circumference");
    assert!(head["standing_unavailable"].as_str().unwrap().starts_with("No data"));
    assert!((summary.age_months.unwrap() - 1.0).abs() < 1e-9);
}
