use retention_core::{
    config::RecommendationThresholds,
    insight::generate_segment_recommendations,
    rfm::RfmRecord,
    segment::{
        classify_segment, segment_info, segment_stats, SegmentStats, AT_RISK, AVERAGE,
        CANT_LOSE_THEM, CHAMPIONS, HIBERNATING, NEW_CUSTOMERS, RECENT_CUSTOMER, SEGMENT_RULES,
    },
    AnalyticsError,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn segment_of(code: &str) -> &'static str {
    classify_segment(code).unwrap().name
}

fn record(key: &str, segment: &str, recency_days: i64, frequency: usize, monetary: f64) -> RfmRecord {
    RfmRecord {
        customer_key: key.to_string(),
        recency_days,
        frequency,
        monetary,
        r_score: 3,
        f_score: 3,
        m_score: 3,
        rfm_code: "333".to_string(),
        segment: segment.to_string(),
    }
}

fn stat(segment: &str, count: usize, percentage: f64, total_revenue: f64) -> SegmentStats {
    SegmentStats {
        segment: segment.to_string(),
        count,
        percentage,
        avg_recency_days: 0.0,
        avg_frequency: 1.0,
        avg_monetary: total_revenue / count.max(1) as f64,
        total_revenue,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every code in {1..5}³ resolves to exactly one named segment.
#[test]
fn classification_is_total() {
    let mut names = Vec::new();
    for r in 1..=5 {
        for f in 1..=5 {
            for m in 1..=5 {
                let code = format!("{r}{f}{m}");
                let info = classify_segment(&code).unwrap();
                assert!(!info.name.is_empty(), "{code}");
                assert!(!info.action.is_empty(), "{code}");
                names.push(info.name);
            }
        }
    }
    assert_eq!(names.len(), 125);
}

#[test]
fn rule_table_examples() {
    assert_eq!(segment_of("555"), CHAMPIONS);
    assert_eq!(segment_of("344"), "Loyal Customers");
    assert_eq!(segment_of("422"), "Potential Loyalists");
    assert_eq!(segment_of("412"), NEW_CUSTOMERS);
    assert_eq!(segment_of("311"), "Promising");
    assert_eq!(segment_of("233"), "Need Attention");
    assert_eq!(segment_of("212"), "About to Sleep");
    assert_eq!(segment_of("243"), AT_RISK);
    assert_eq!(segment_of("155"), CANT_LOSE_THEM);
}

/// Overlapping rules resolve in table order.
#[test]
fn first_matching_rule_wins() {
    // Champions before Loyal Customers
    assert_eq!(segment_of("544"), CHAMPIONS);
    // Hibernating before Lost
    assert_eq!(segment_of("111"), HIBERNATING);
    assert_eq!(segment_of("112"), HIBERNATING);
    // Need Attention before About to Sleep
    assert_eq!(segment_of("322"), "Need Attention");
}

#[test]
fn fallback_heuristics() {
    assert_eq!(segment_of("514"), RECENT_CUSTOMER);
    assert_eq!(segment_of("534"), RECENT_CUSTOMER);
    assert_eq!(segment_of("135"), AT_RISK);
    assert_eq!(segment_of("355"), AVERAGE);
    assert_eq!(segment_of("315"), AVERAGE);
}

#[test]
fn malformed_codes_are_rejected() {
    for code in ["", "12", "1234", "612", "106", "abc", "5 5"] {
        assert!(
            matches!(classify_segment(code), Err(AnalyticsError::InvalidRfmCode { .. })),
            "{code:?} should be rejected"
        );
    }
}

#[test]
fn every_named_segment_has_static_info() {
    for rule in SEGMENT_RULES.iter() {
        let info = segment_info(rule.info.name).unwrap();
        assert_eq!(info, rule.info);
    }
    assert!(segment_info(RECENT_CUSTOMER).is_some());
    assert!(segment_info(AVERAGE).is_some());
    assert!(segment_info("Whales").is_none());
}

#[test]
fn stats_are_ordered_by_revenue_then_name() {
    let records = vec![
        record("a", HIBERNATING, 300, 1, 100.0),
        record("b", AT_RISK, 200, 3, 100.0),
        record("c", CHAMPIONS, 5, 4, 600.0),
        record("d", CHAMPIONS, 15, 6, 400.0),
    ];
    let stats = segment_stats(&records);

    let names: Vec<&str> = stats.iter().map(|s| s.segment.as_str()).collect();
    assert_eq!(names, vec![CHAMPIONS, AT_RISK, HIBERNATING]);

    let champions = &stats[0];
    assert_eq!(champions.count, 2);
    assert_eq!(champions.percentage, 50.0);
    assert_eq!(champions.avg_recency_days, 10.0);
    assert_eq!(champions.avg_frequency, 5.0);
    assert_eq!(champions.avg_monetary, 500.0);
    assert_eq!(champions.total_revenue, 1000.0);

    let total: f64 = stats.iter().map(|s| s.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn stats_of_nothing_are_empty() {
    assert!(segment_stats(&Vec::<RfmRecord>::new()).is_empty());
}

#[test]
fn recommendations_follow_segment_shares() {
    let stats = vec![
        stat(CHAMPIONS, 10, 10.0, 12_500.0),
        stat(AT_RISK, 15, 15.0, 3_000.0),
        stat(HIBERNATING, 25, 25.0, 1_000.0),
        stat(NEW_CUSTOMERS, 30, 30.0, 900.0),
        stat("Promising", 20, 20.0, 400.0),
    ];
    let recs = generate_segment_recommendations(&stats, &RecommendationThresholds::default());

    assert_eq!(recs.len(), 5);
    assert!(recs[0].starts_with("HIGH PRIORITY: 15 valuable customers (15.0%)"));
    assert!(recs[1].starts_with("25 customers hibernating"));
    assert!(recs[2].starts_with("30 new customers need onboarding"));
    assert_eq!(
        recs[3],
        "10 Champions generating $12,500 revenue. Consider VIP program and referral incentives."
    );
    assert!(recs[4].starts_with("20 customers showing promise"));
}

#[test]
fn small_at_risk_and_hibernating_shares_stay_quiet() {
    let stats = vec![
        stat(CHAMPIONS, 80, 80.0, 9_000.0),
        stat(AT_RISK, 10, 10.0, 500.0),
        stat(HIBERNATING, 10, 10.0, 100.0),
    ];
    let recs = generate_segment_recommendations(&stats, &RecommendationThresholds::default());
    assert_eq!(recs.len(), 1);
    assert!(recs[0].starts_with("80 Champions"));
}

/// Shares are compared at one decimal, as displayed.
#[test]
fn recommendation_shares_compare_at_one_decimal() {
    let thresholds = RecommendationThresholds::default();

    let quiet = vec![stat(AT_RISK, 10, 10.04, 500.0), stat(HIBERNATING, 20, 20.04, 100.0)];
    assert!(generate_segment_recommendations(&quiet, &thresholds).is_empty());

    let loud = vec![stat(AT_RISK, 10, 10.06, 500.0), stat(HIBERNATING, 20, 20.06, 100.0)];
    let recs = generate_segment_recommendations(&loud, &thresholds);
    assert_eq!(recs.len(), 2);
    assert!(recs[0].starts_with("HIGH PRIORITY: 10 valuable customers (10.1%)"));
    assert!(recs[1].starts_with("20 customers hibernating"));
}

#[test]
fn no_segments_no_recommendations() {
    assert!(generate_segment_recommendations(&[], &RecommendationThresholds::default()).is_empty());
}
