use chrono::{NaiveDate, TimeZone, Utc};
use retention_core::{
    cohort::{assign_cohort, cohort_start_date, group_by_cohort, CohortPeriod},
    customer::{aggregate_customers, CustomerMap},
    order::Order,
    retention::{compute_cohort_metrics, CohortMetrics, RetentionWindow, DEFAULT_CHURN_DAYS, DEFAULT_WINDOWS},
    types::Timestamp,
    AnalyticsError,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn order(key: &str, y: i32, m: u32, d: u32, amount: f64) -> Order {
    Order::new(key, ts(y, m, d), amount)
}

fn metrics_for(customers: &CustomerMap, period: CohortPeriod, now: Timestamp) -> Vec<CohortMetrics> {
    let sorted = customers.sorted();
    let grouped = group_by_cohort(sorted.iter().copied(), period);
    compute_cohort_metrics(&grouped, now, &DEFAULT_WINDOWS, DEFAULT_CHURN_DAYS).unwrap()
}

/// Three January customers: one single-order, one two-order, one three-order.
fn january_cohort() -> CustomerMap {
    aggregate_customers(vec![
        order("a", 2024, 1, 5, 100.0),
        order("b", 2024, 1, 10, 50.0),
        order("b", 2024, 3, 1, 50.0),
        order("c", 2024, 1, 15, 200.0),
        order("c", 2024, 2, 15, 200.0),
        order("c", 2024, 6, 1, 200.0),
    ])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn monthly_labels_respect_year_boundary() {
    let late = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(assign_cohort(late, CohortPeriod::Monthly), "2023-12");
    assert_eq!(assign_cohort(early, CohortPeriod::Monthly), "2024-01");
}

#[test]
fn weekly_labels_are_zero_padded() {
    assert_eq!(assign_cohort(ts(2024, 1, 1), CohortPeriod::Weekly), "2024-W01");
    assert_eq!(assign_cohort(ts(2024, 1, 7), CohortPeriod::Weekly), "2024-W02");
    assert_eq!(assign_cohort(ts(2024, 3, 15), CohortPeriod::Weekly), "2024-W11");
}

#[test]
fn cohort_start_dates() {
    assert_eq!(cohort_start_date("2024-06").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(cohort_start_date("2024-W09").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert!(matches!(
        cohort_start_date("June 2024"),
        Err(AnalyticsError::InvalidCohortLabel { .. })
    ));
    assert!(matches!(
        cohort_start_date("2024-13"),
        Err(AnalyticsError::InvalidCohortLabel { .. })
    ));
}

/// Worked example: 3 customers, $800 revenue, one single-order churner.
#[test]
fn january_cohort_metrics() {
    let customers = january_cohort();
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, ts(2025, 1, 1));

    assert_eq!(metrics.len(), 1);
    let jan = &metrics[0];
    assert_eq!(jan.cohort_label, "2024-01");
    assert_eq!(jan.customer_count, 3);
    assert_eq!(jan.total_orders, 6);
    assert_eq!(jan.revenue, 800.0);
    assert!((jan.ltv - 266.666_666).abs() < 1e-3);
    assert_eq!(jan.ltv_rounded(), 267.0);
    assert!((jan.avg_order_value - 800.0 / 6.0).abs() < 1e-9);
    assert_eq!(jan.avg_orders_per_customer, 2.0);
    assert_eq!(jan.churned, 1);
    assert_eq!(jan.churn_rate, 33);

    // All five windows have elapsed (12m ends exactly at now).
    assert_eq!(jan.retention_rates.len(), 5);
    for w in DEFAULT_WINDOWS {
        assert_eq!(jan.retention(w), Some(67), "window {w}m");
    }
}

/// A window that has not fully elapsed is absent, not zero.
#[test]
fn immature_windows_are_omitted() {
    let customers = aggregate_customers(vec![
        order("a", 2024, 6, 3, 40.0),
        order("a", 2024, 8, 3, 40.0),
        order("b", 2024, 6, 20, 10.0),
    ]);
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, ts(2025, 1, 15));
    let june = &metrics[0];

    let keys: Vec<RetentionWindow> = june.retention_rates.keys().copied().collect();
    assert_eq!(
        keys,
        vec![RetentionWindow(1), RetentionWindow(2), RetentionWindow(3), RetentionWindow(6)]
    );
    assert_eq!(june.retention(12), None);
    assert_eq!(june.retention(6), Some(50));
}

#[test]
fn window_ending_one_second_after_now_is_omitted() {
    let customers = aggregate_customers(vec![order("a", 2024, 6, 3, 40.0)]);
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, now);
    assert!(metrics[0].retention_rates.is_empty());

    let metrics = metrics_for(&customers, CohortPeriod::Monthly, ts(2024, 7, 1));
    assert_eq!(metrics[0].retention(1), Some(0));
}

/// Any repeat purchase counts toward every elapsed window.
#[test]
fn repeat_buyer_counts_for_every_elapsed_window() {
    let customers = aggregate_customers(vec![
        order("a", 2023, 1, 2, 10.0),
        order("a", 2023, 1, 9, 10.0),
    ]);
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, ts(2025, 1, 1));
    for w in DEFAULT_WINDOWS {
        assert_eq!(metrics[0].retention(w), Some(100));
    }
}

#[test]
fn churn_needs_single_order_and_inactivity() {
    let now = ts(2024, 12, 1);
    let customers = aggregate_customers(vec![
        // single order, inactive: churned
        order("a", 2024, 1, 1, 10.0),
        order("b", 2024, 1, 20, 10.0),
        // single order, recent: not churned
        order("x", 2024, 11, 20, 10.0),
        // repeat buyer, inactive: not churned
        order("rep", 2024, 1, 3, 10.0),
        order("rep", 2024, 1, 4, 10.0),
    ]);
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, now);
    let jan = metrics.iter().find(|m| m.cohort_label == "2024-01").unwrap();

    assert_eq!(jan.customer_count, 3);
    assert_eq!(jan.churned, 2);
    assert_eq!(jan.churn_rate, 67);

    let nov = metrics.iter().find(|m| m.cohort_label == "2024-11").unwrap();
    assert_eq!(nov.churned, 0);
}

#[test]
fn cohorts_are_ordered_most_recent_first() {
    let customers = aggregate_customers(vec![
        order("a", 2023, 11, 1, 10.0),
        order("b", 2024, 2, 1, 10.0),
        order("c", 2023, 12, 1, 10.0),
        order("d", 2024, 1, 1, 10.0),
    ]);
    let metrics = metrics_for(&customers, CohortPeriod::Monthly, ts(2025, 1, 1));
    let labels: Vec<&str> = metrics.iter().map(|m| m.cohort_label.as_str()).collect();
    assert_eq!(labels, vec!["2024-02", "2024-01", "2023-12", "2023-11"]);
}

#[test]
fn weekly_cohorts_compute() {
    let customers = aggregate_customers(vec![
        order("a", 2024, 1, 2, 10.0),
        order("a", 2024, 4, 2, 10.0),
        order("b", 2024, 1, 3, 30.0),
    ]);
    let metrics = metrics_for(&customers, CohortPeriod::Weekly, ts(2025, 6, 1));

    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].cohort_label, "2024-W01");
    assert_eq!(metrics[0].customer_count, 2);
    assert_eq!(metrics[0].retention(12), Some(50));
}

#[test]
fn empty_population_has_no_cohorts() {
    let customers = aggregate_customers(Vec::new());
    assert!(metrics_for(&customers, CohortPeriod::Monthly, ts(2025, 1, 1)).is_empty());
}

/// Σ customer_count over cohorts equals the population size.
#[test]
fn cohort_sizes_partition_the_population() {
    let orders = retention_core::synthetic::SyntheticFeed::new("sizes", 5, ts(2025, 1, 1))
        .with_customers(300)
        .generate();
    let customers = aggregate_customers(orders);

    for period in [CohortPeriod::Monthly, CohortPeriod::Weekly] {
        let metrics = metrics_for(&customers, period, ts(2025, 1, 1));
        let total: usize = metrics.iter().map(|m| m.customer_count).sum();
        assert_eq!(total, customers.len(), "{period}");
        for m in &metrics {
            assert!(m.churn_rate <= 100);
            assert!(m.retention_rates.values().all(|r| *r <= 100));
        }
    }
}

#[test]
fn out_of_range_churn_horizon_is_an_error() {
    let customers = january_cohort();
    let sorted = customers.sorted();
    let grouped = group_by_cohort(sorted.iter().copied(), CohortPeriod::Monthly);
    for days in [i64::MAX, 100_000_000] {
        assert!(matches!(
            compute_cohort_metrics(&grouped, ts(2025, 1, 1), &DEFAULT_WINDOWS, days),
            Err(AnalyticsError::InvalidConfig { .. })
        ));
    }
}
