//! Cohort retention — maturity-window retention, churn and LTV per cohort.
//!
//! A window is reported only once it has fully elapsed: if
//! `cohort_start + w months` is still in the future at `now`, the `w`
//! window is left out of the cohort's map instead of reporting a rate
//! that would look artificially low.
//!
//! Retained means: the customer's first and last orders are at least `w`
//! calendar months apart, OR the customer ordered more than once. Any
//! repeat buyer therefore counts as retained for every elapsed window.

use crate::{
    clock::{add_months, months_between, start_of_day},
    cohort::cohort_start_date,
    customer::CustomerProfile,
    error::{AnalyticsError, AnalyticsResult},
    types::{CohortLabel, Timestamp},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const DEFAULT_WINDOWS: [u32; 5] = [1, 2, 3, 6, 12];
pub const DEFAULT_CHURN_DAYS: i64 = 90;
/// Upper bound for the churn inactivity horizon (about a century).
pub const MAX_CHURN_DAYS: i64 = 36_500;

// ── Public types ─────────────────────────────────────────────────────────────

/// A maturity window in months. Displays and serializes as `"3m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RetentionWindow(pub u32);

impl fmt::Display for RetentionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl From<RetentionWindow> for String {
    fn from(w: RetentionWindow) -> Self {
        w.to_string()
    }
}

impl FromStr for RetentionWindow {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_suffix('m')
            .and_then(|n| n.parse().ok())
            .map(RetentionWindow)
            .ok_or_else(|| AnalyticsError::InvalidConfig {
                reason: format!("bad retention window label '{s}'"),
            })
    }
}

impl TryFrom<String> for RetentionWindow {
    type Error = AnalyticsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMetrics {
    pub cohort_label:            CohortLabel,
    pub customer_count:          usize,
    pub revenue:                 f64,
    pub total_orders:            usize,
    pub avg_order_value:         f64,
    pub avg_orders_per_customer: f64,
    /// Elapsed windows only. Percentages 0–100.
    pub retention_rates:         BTreeMap<RetentionWindow, u32>,
    pub churned:                 usize,
    pub churn_rate:              u32,
    /// Full precision; round only for display.
    pub ltv:                     f64,
}

impl CohortMetrics {
    pub fn ltv_rounded(&self) -> f64 {
        self.ltv.round()
    }

    pub fn retention(&self, months: u32) -> Option<u32> {
        self.retention_rates.get(&RetentionWindow(months)).copied()
    }
}

/// `round(100 · part / whole)` as an integer percentage.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as u32
}

// ── Computation ──────────────────────────────────────────────────────────────

/// Metrics for a single cohort. `None` for an empty group.
pub fn cohort_metrics(
    label: &str,
    customers: &[&CustomerProfile],
    now: Timestamp,
    windows: &[u32],
    churn_days: i64,
) -> AnalyticsResult<Option<CohortMetrics>> {
    if customers.is_empty() {
        log::warn!("retention: cohort {label} has no customers, skipping");
        return Ok(None);
    }

    let cohort_start = cohort_start_date(label)?;
    let size = customers.len();
    let revenue: f64 = customers.iter().map(|c| c.total_spent).sum();
    let total_orders: usize = customers.iter().map(|c| c.order_count()).sum();

    let mut retention_rates = BTreeMap::new();
    for &w in windows {
        let elapsed = add_months(cohort_start, w)
            .map(|end| start_of_day(end) <= now)
            .unwrap_or(false);
        if !elapsed {
            continue;
        }
        let retained = customers
            .iter()
            .filter(|c| {
                months_between(c.first_order_at, c.last_order_at) >= w as i32
                    || c.order_count() > 1
            })
            .count();
        retention_rates.insert(RetentionWindow(w), percent(retained, size));
    }

    let churn_cutoff = Duration::try_days(churn_days)
        .and_then(|horizon| now.checked_sub_signed(horizon))
        .ok_or_else(|| AnalyticsError::InvalidConfig {
            reason: format!("churn horizon of {churn_days} days is out of range"),
        })?;
    let churned = customers
        .iter()
        .filter(|c| c.order_count() == 1 && c.last_order_at < churn_cutoff)
        .count();

    Ok(Some(CohortMetrics {
        cohort_label: label.to_string(),
        customer_count: size,
        revenue,
        total_orders,
        avg_order_value: if total_orders > 0 { revenue / total_orders as f64 } else { 0.0 },
        avg_orders_per_customer: total_orders as f64 / size as f64,
        retention_rates,
        churned,
        churn_rate: percent(churned, size),
        ltv: revenue / size as f64,
    }))
}

/// Metrics for every cohort, most recent label first.
pub fn compute_cohort_metrics(
    profiles_by_cohort: &BTreeMap<CohortLabel, Vec<&CustomerProfile>>,
    now: Timestamp,
    windows: &[u32],
    churn_days: i64,
) -> AnalyticsResult<Vec<CohortMetrics>> {
    let mut out = Vec::with_capacity(profiles_by_cohort.len());
    for (label, customers) in profiles_by_cohort.iter().rev() {
        if let Some(metrics) = cohort_metrics(label, customers, now, windows, churn_days)? {
            out.push(metrics);
        }
    }
    log::debug!("retention: computed {} cohorts", out.len());
    Ok(out)
}
