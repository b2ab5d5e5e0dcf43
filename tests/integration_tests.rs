use chrono::{Duration, Local, NaiveDate};
use pufflog::models::*;
use pufflog::services::plan;
use pufflog::services::stats::StatsAggregator;
use pufflog::services::store::FileStore;
use pufflog::services::KeyValueStore;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn event_at(day: NaiveDate, hour: u32) -> UsageEvent {
    let ts = day
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .unwrap();
    UsageEvent::new(ts, 20.0)
}

#[test]
fn test_curve_boundary_and_length_invariants() {
    for &(days, start) in &[(1usize, 50u32), (2, 5), (10, 3), (14, 140), (30, 100), (120, 400)] {
        let curve = plan::generate(days, start);
        assert_eq!(curve.len(), days);
        assert_eq!(*curve.last().unwrap(), 0);
        if days > 1 {
            assert_eq!(curve[0], start);
        }
    }
}

#[test]
fn test_degenerate_single_day_plan() {
    assert_eq!(plan::generate(1, 999), vec![0]);
}

#[test]
fn test_low_start_stays_at_or_above_one() {
    let curve = plan::generate(10, 3);
    assert_eq!(curve[0], 3);
    assert_eq!(curve[9], 0);
    for pair in curve.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
    for &value in &curve[1..9] {
        assert!(value >= 1);
    }
}

#[test]
fn test_normal_curve_non_increasing() {
    let curve = plan::generate(30, 100);
    for pair in curve.windows(2) {
        assert!(pair[0] >= pair[1], "increase within {curve:?}");
    }
}

#[test]
fn test_zero_over_zero_window() {
    let snapshot = pufflog::services::stats::UsageSnapshot::default();
    let cost = CostModel::default();
    let agg = StatsAggregator::new(&snapshot, date(2026, 3, 10), 5, Some(10.0), &cost);

    let summary = agg.summarize(WindowKind::Day);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.previous_total, 0);
    assert_eq!(summary.change_percent, Some(0));
}

#[test]
fn test_zero_baseline_with_usage_reports_zero_percent() {
    let today = date(2026, 3, 10);
    let snapshot =
        pufflog::services::stats::UsageSnapshot::new([(today, 30u64)].into_iter().collect());
    let cost = CostModel::default();
    let agg = StatsAggregator::new(&snapshot, today, 5, Some(10.0), &cost);

    // Yesterday was zero; the documented policy reports 0%, not +inf
    let summary = agg.summarize(WindowKind::Day);
    assert_eq!(summary.total, 30);
    assert_eq!(summary.change_percent, Some(0));
}

#[test]
fn test_savings_sign_follows_usage_vs_baseline() {
    let today = date(2026, 3, 10);
    let cost = CostModel::default();

    let light =
        pufflog::services::stats::UsageSnapshot::new([(today, 5u64)].into_iter().collect());
    let agg = StatsAggregator::new(&light, today, 10, Some(20.0), &cost);
    assert!(agg.summarize(WindowKind::Day).amount_saved > 0.0);

    let heavy =
        pufflog::services::stats::UsageSnapshot::new([(today, 60u64)].into_iter().collect());
    let agg = StatsAggregator::new(&heavy, today, 10, Some(20.0), &cost);
    assert!(agg.summarize(WindowKind::Day).amount_saved < 0.0);
}

#[tokio::test]
async fn test_corrupt_day_record_counts_as_zero() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().to_path_buf());

    let good_day = date(2026, 3, 1);
    let bad_day = date(2026, 3, 2);
    store.append_event(event_at(good_day, 10)).await.unwrap();
    store.append_event(event_at(good_day, 11)).await.unwrap();
    store
        .set(&FileStore::day_key(bad_day), "this is not json {{{")
        .await
        .unwrap();

    // The corrupt day must not abort the snapshot load
    let snapshot = store.usage_snapshot().await.unwrap();
    assert_eq!(snapshot.count_for(good_day), 2);
    assert_eq!(snapshot.count_for(bad_day), 0);

    let cost = CostModel::default();
    let agg = StatsAggregator::new(&snapshot, bad_day, 2, Some(10.0), &cost);
    let summary = agg.summarize(WindowKind::Day);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.previous_total, 2);
}

#[tokio::test]
async fn test_plan_persistence_across_store_instances() {
    let temp_dir = TempDir::new().unwrap();

    let curve = {
        let store = FileStore::new(temp_dir.path().to_path_buf());
        let spec = PlanSpec::new(140, date(2026, 3, 1), date(2026, 3, 14));
        let curve = plan::generate(spec.total_days, spec.start_count);
        store
            .save_plan(&PlanState {
                spec,
                curve: curve.clone(),
            })
            .await
            .unwrap();
        curve
    };

    // New store instance (simulating restart) sees the same curve verbatim
    let store = FileStore::new(temp_dir.path().to_path_buf());
    let loaded = store.load_plan().await.unwrap().unwrap();
    assert_eq!(loaded.curve, curve);
    assert_eq!(loaded.spec.start_count, 140);
    assert_eq!(loaded.spec.total_days, 14);
}

#[tokio::test]
async fn test_undo_is_a_day_local_truncation() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().to_path_buf());
    let day = date(2026, 3, 5);

    store.append_event(event_at(day, 9)).await.unwrap();
    store.append_event(event_at(day, 12)).await.unwrap();

    let removed = store.undo_last(day).await.unwrap().unwrap();
    assert_eq!(removed.timestamp.format("%H").to_string(), "12");
    assert_eq!(store.events_for(day).await.unwrap().len(), 1);
}

/// End-to-end: a generated curve, replayed as actual usage, feeds the
/// weekly aggregation.
#[tokio::test]
async fn test_plan_curve_feeds_weekly_stats() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().to_path_buf());

    let total_days = 14usize;
    let start_count = 140u32;
    let curve = plan::generate(total_days, start_count);
    assert_eq!(curve.len(), total_days);
    assert_eq!(curve[0], 140);
    assert_eq!(curve[13], 0);

    // Replay the curve as recorded usage ending today
    let today = Local::now().date_naive();
    for (i, &count) in curve.iter().enumerate() {
        let day = today - Duration::days((total_days - 1 - i) as i64);
        for _ in 0..count {
            store.append_event(event_at(day, 12)).await.unwrap();
        }
    }

    let snapshot = store.usage_snapshot().await.unwrap();
    let cost = CostModel::default();
    let agg = StatsAggregator::new(&snapshot, today, total_days as u32, Some(140.0), &cost);

    let week = agg.summarize(WindowKind::Week);
    let expected: u64 = curve[total_days - 7..].iter().map(|&v| v as u64).sum();
    assert_eq!(week.total, expected);

    let previous_expected: u64 = curve[..total_days - 7].iter().map(|&v| v as u64).sum();
    assert_eq!(week.previous_total, previous_expected);
}

#[tokio::test]
async fn test_key_value_roundtrip_and_listing() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path().to_path_buf());

    store.set("day-2026-03-01", "[]").await.unwrap();
    store.set("day-2026-03-02", "[]").await.unwrap();
    store.set("plan", "{}").await.unwrap();

    assert_eq!(store.get("day-2026-03-01").await.unwrap().unwrap(), "[]");
    assert!(store.get("day-2026-12-31").await.unwrap().is_none());

    let days = store.list_keys("day-").await.unwrap();
    assert_eq!(days, vec!["day-2026-03-01", "day-2026-03-02"]);

    store.remove("day-2026-03-01").await.unwrap();
    assert!(store.get("day-2026-03-01").await.unwrap().is_none());
    // Removing an absent key is not an error
    store.remove("day-2026-03-01").await.unwrap();
}

#[test]
fn test_default_config() {
    let config = UserConfig::default();
    assert!(config.baseline_daily_rate.is_none());
    assert_eq!(config.default_strength, 20.0);
    assert_eq!(config.cost_model.puffs_per_pod, 500.0);
    assert_eq!(config.cost_model.pod_cost, 10.0);
}
