//! Aggregates and heuristic insights over computed cohorts and segments.
//!
//! Every check here is an independent threshold test over numbers that
//! were already computed upstream. Checks run in a fixed order and any
//! subset may fire; the output preserves that order.

use crate::{
    cohort::is_weekly_label,
    config::{InsightThresholds, RecommendationThresholds},
    retention::{CohortMetrics, RetentionWindow},
    segment::{
        SegmentStats, AT_RISK, CANT_LOSE_THEM, CHAMPIONS, HIBERNATING, LOST, NEW_CUSTOMERS,
        POTENTIAL_LOYALISTS, PROMISING,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    LtvDecline,
    LtvGrowth,
    EarlyChurn,
    BestCohort,
    SeasonalLtv,
    HighChurnCohorts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Positive,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind:     InsightKind,
    pub severity: Severity,
    pub message:  String,
}

impl Insight {
    fn new(kind: InsightKind, severity: Severity, message: String) -> Self {
        Self { kind, severity, message }
    }
}

// ── Overall retention ────────────────────────────────────────────────────────

/// Customer-weighted retention per window, over the cohorts that have
/// reached that window. Immature cohorts are excluded, not counted as 0.
pub fn compute_overall_retention(metrics: &[CohortMetrics]) -> BTreeMap<RetentionWindow, f64> {
    let mut sums: BTreeMap<RetentionWindow, (f64, usize)> = BTreeMap::new();
    for cohort in metrics {
        for (window, rate) in &cohort.retention_rates {
            let entry = sums.entry(*window).or_insert((0.0, 0));
            entry.0 += *rate as f64 * cohort.customer_count as f64;
            entry.1 += cohort.customer_count;
        }
    }
    sums.into_iter()
        .filter(|(_, (_, customers))| *customers > 0)
        .map(|(window, (weighted, customers))| (window, weighted / customers as f64))
        .collect()
}

// ── Cohort insights ──────────────────────────────────────────────────────────

fn mean_ltv(cohorts: &[CohortMetrics]) -> f64 {
    cohorts.iter().map(|c| c.ltv).sum::<f64>() / cohorts.len() as f64
}

/// `metrics` must be ordered most recent first, as returned by
/// `compute_cohort_metrics`.
pub fn generate_insights(
    metrics: &[CohortMetrics],
    overall: &BTreeMap<RetentionWindow, f64>,
    t: &InsightThresholds,
) -> Vec<Insight> {
    let mut out = Vec::new();

    // 1. Recent vs older cohort LTV
    let n = t.recent_cohort_count;
    if metrics.len() > n && n > 0 {
        let recent = &metrics[..n];
        let older = &metrics[n..metrics.len().min(2 * n)];
        let recent_ltv = mean_ltv(recent);
        let older_ltv = mean_ltv(older);

        if older_ltv > 0.0 {
            if recent_ltv <= older_ltv * (1.0 - t.ltv_shift_ratio) {
                out.push(Insight::new(
                    InsightKind::LtvDecline,
                    Severity::Warning,
                    format!(
                        "WARNING: Recent cohorts showing {:.0}% lower LTV than historical cohorts.",
                        ((1.0 - recent_ltv / older_ltv) * 100.0).round()
                    ),
                ));
            } else if recent_ltv >= older_ltv * (1.0 + t.ltv_shift_ratio) {
                out.push(Insight::new(
                    InsightKind::LtvGrowth,
                    Severity::Positive,
                    format!(
                        "POSITIVE: Recent cohorts showing {:.0}% higher LTV than historical.",
                        ((recent_ltv / older_ltv - 1.0) * 100.0).round()
                    ),
                ));
            }
        }
    }

    // 2. Early drop-off between month 1 and month 3
    if let (Some(m1), Some(m3)) = (
        overall.get(&RetentionWindow(1)),
        overall.get(&RetentionWindow(3)),
    ) {
        // on whole percents
        let dropoff = m1.round() - m3.round();
        if dropoff > t.early_churn_dropoff_points {
            out.push(Insight::new(
                InsightKind::EarlyChurn,
                Severity::Warning,
                format!(
                    "High early churn: {:.0}% of customers drop off between month 1 and 3. \
                     Focus on early engagement.",
                    dropoff
                ),
            ));
        }
    }

    // 3. Best cohort by LTV (ties go to the most recent)
    let best = metrics.iter().fold(None::<&CohortMetrics>, |best, m| match best {
        Some(b) if b.ltv >= m.ltv => Some(b),
        _ => Some(m),
    });
    if let Some(best) = best {
        out.push(Insight::new(
            InsightKind::BestCohort,
            Severity::Info,
            format!(
                "Best performing cohort: {} with ${} LTV and {:.1} orders/customer.",
                best.cohort_label,
                format_money(best.ltv),
                best.avg_orders_per_customer
            ),
        ));
    }

    // 4. Q4 seasonality across monthly cohorts
    let monthly: Vec<&CohortMetrics> = metrics
        .iter()
        .filter(|m| !is_weekly_label(&m.cohort_label))
        .collect();
    if monthly.len() >= t.seasonal_min_monthly_cohorts {
        let (q4, rest): (Vec<&CohortMetrics>, Vec<&CohortMetrics>) =
            monthly.into_iter().partition(|m| is_q4_label(&m.cohort_label));
        if !q4.is_empty() && !rest.is_empty() {
            let q4_ltv = q4.iter().map(|m| m.ltv).sum::<f64>() / q4.len() as f64;
            let rest_ltv = rest.iter().map(|m| m.ltv).sum::<f64>() / rest.len() as f64;
            if rest_ltv > 0.0 && (q4_ltv - rest_ltv).abs() > rest_ltv * t.seasonal_ltv_ratio {
                let direction = if q4_ltv > rest_ltv { "higher" } else { "lower" };
                out.push(Insight::new(
                    InsightKind::SeasonalLtv,
                    Severity::Info,
                    format!(
                        "Q4 (holiday) cohorts show {:.0}% {direction} LTV than rest of year.",
                        ((q4_ltv - rest_ltv).abs() / rest_ltv * 100.0).round()
                    ),
                ));
            }
        }
    }

    // 5. Cohorts with majority churn
    let high_churn: Vec<&str> = metrics
        .iter()
        .filter(|m| m.churn_rate > t.high_churn_rate_pct)
        .map(|m| m.cohort_label.as_str())
        .collect();
    if !high_churn.is_empty() {
        out.push(Insight::new(
            InsightKind::HighChurnCohorts,
            Severity::Warning,
            format!(
                "{} cohorts with >{}% churn rate ({}). Review acquisition channels for these periods.",
                high_churn.len(),
                t.high_churn_rate_pct,
                high_churn.join(", ")
            ),
        ));
    }

    out
}

fn is_q4_label(label: &str) -> bool {
    matches!(label.get(5..7), Some("10" | "11" | "12"))
}

// ── Segment recommendations ──────────────────────────────────────────────────

/// Marketing recommendations from segment shares. `stats` in the order
/// returned by `segment_stats` (highest revenue first); where a check
/// names two segments, the first one present in that order is used.
pub fn generate_segment_recommendations(
    stats: &[SegmentStats],
    t: &RecommendationThresholds,
) -> Vec<String> {
    let first_of = |names: &[&str]| stats.iter().find(|s| names.contains(&s.segment.as_str()));
    // one-decimal share
    let share = |s: &SegmentStats| (s.percentage * 10.0).round() / 10.0;
    let mut out = Vec::new();

    if let Some(s) = first_of(&[AT_RISK, CANT_LOSE_THEM]) {
        if share(s) > t.at_risk_share_pct {
            out.push(format!(
                "HIGH PRIORITY: {} valuable customers ({:.1}%) at risk of churning. \
                 Launch targeted win-back campaign.",
                s.count, s.percentage
            ));
        }
    }

    if let Some(s) = first_of(&[HIBERNATING, LOST]) {
        if share(s) > t.hibernating_share_pct {
            out.push(format!(
                "{} customers hibernating. Consider re-engagement campaign with strong offer.",
                s.count
            ));
        }
    }

    if let Some(s) = first_of(&[NEW_CUSTOMERS]) {
        if s.count > 0 {
            out.push(format!(
                "{} new customers need onboarding. Send welcome series and second-purchase incentive.",
                s.count
            ));
        }
    }

    if let Some(s) = first_of(&[CHAMPIONS]) {
        out.push(format!(
            "{} Champions generating ${} revenue. Consider VIP program and referral incentives.",
            s.count,
            format_money(s.total_revenue)
        ));
    }

    if let Some(s) = first_of(&[PROMISING, POTENTIAL_LOYALISTS]) {
        if s.count > 0 {
            out.push(format!(
                "{} customers showing promise. Nurture with educational content and product recommendations.",
                s.count
            ));
        }
    }

    out
}

/// Whole currency units with thousands separators: `1234567.8` → `1,234,568`.
pub fn format_money(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(0.4), "0");
        assert_eq!(format_money(266.666), "267");
        assert_eq!(format_money(1234.0), "1,234");
        assert_eq!(format_money(1234567.8), "1,234,568");
    }

    #[test]
    fn q4_labels() {
        assert!(is_q4_label("2023-10"));
        assert!(is_q4_label("2023-12"));
        assert!(!is_q4_label("2023-09"));
        assert!(!is_q4_label("2023"));
    }
}
