//! RFM scoring — population-relative quintile scores.
//!
//! Scoring runs in two phases:
//!   1. Collect every customer's raw metrics and freeze one sorted
//!      `QuintileScale` per metric. No customer is scored before all
//!      metrics are in.
//!   2. Score each customer independently against the frozen scales.
//!
//! Scales are built per call. Nothing is cached between populations.

use crate::{
    customer::CustomerProfile,
    segment::classify_scores,
    types::{CustomerKey, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmRecord {
    pub customer_key: CustomerKey,
    pub recency_days: i64,
    pub frequency:    usize,
    pub monetary:     f64,
    pub r_score:      u8,
    pub f_score:      u8,
    pub m_score:      u8,
    pub rfm_code:     String,
    pub segment:      String,
}

/// Raw metrics for one customer, gathered in phase 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfmMetrics {
    pub recency_days: i64,
    pub frequency:    usize,
    pub monetary:     f64,
}

impl RfmMetrics {
    pub fn of(profile: &CustomerProfile, now: Timestamp) -> Self {
        Self {
            recency_days: profile.recency_days(now),
            frequency:    profile.order_count(),
            monetary:     profile.total_spent,
        }
    }
}

/// One metric's sorted population, frozen before any scoring.
#[derive(Debug, Clone)]
pub struct QuintileScale {
    sorted: Vec<f64>,
}

impl QuintileScale {
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        Self { sorted: values }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Ascending quintile in `1..=5`.
    ///
    /// The rank is the index of the first value ≥ `value`, so tied values
    /// share a bucket. `n / 5` is a float, so tiny populations still bucket
    /// without dividing by zero.
    pub fn quintile(&self, value: f64) -> u8 {
        let n = self.sorted.len();
        if n == 0 {
            return 1;
        }
        let position = self.sorted.partition_point(|v| *v < value);
        let bucket = ((position + 1) as f64 / (n as f64 / 5.0)).ceil();
        bucket.clamp(1.0, 5.0) as u8
    }

    /// Descending quintile: the smallest values score 5.
    pub fn inverse_quintile(&self, value: f64) -> u8 {
        6 - self.quintile(value)
    }
}

/// The three frozen scales for one population.
#[derive(Debug, Clone)]
pub struct RfmScales {
    pub recency:   QuintileScale,
    pub frequency: QuintileScale,
    pub monetary:  QuintileScale,
}

impl RfmScales {
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a RfmMetrics>,
    {
        let mut recency = Vec::new();
        let mut frequency = Vec::new();
        let mut monetary = Vec::new();
        for m in metrics {
            recency.push(m.recency_days as f64);
            frequency.push(m.frequency as f64);
            monetary.push(m.monetary);
        }
        Self {
            recency:   QuintileScale::new(recency),
            frequency: QuintileScale::new(frequency),
            monetary:  QuintileScale::new(monetary),
        }
    }

    /// (R, F, M), all on a higher-is-better scale.
    pub fn score(&self, m: &RfmMetrics) -> (u8, u8, u8) {
        (
            self.recency.inverse_quintile(m.recency_days as f64),
            self.frequency.quintile(m.frequency as f64),
            self.monetary.quintile(m.monetary),
        )
    }
}

pub fn rfm_code(r: u8, f: u8, m: u8) -> String {
    format!("{r}{f}{m}")
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Score every profile against the population formed by all of them.
/// Returns records keyed by customer, each already classified.
pub fn score_population<'a, I>(profiles: I, now: Timestamp) -> BTreeMap<CustomerKey, RfmRecord>
where
    I: IntoIterator<Item = &'a CustomerProfile>,
{
    // Phase 1: gather raw metrics for the whole population.
    let gathered: Vec<(&CustomerProfile, RfmMetrics)> = profiles
        .into_iter()
        .map(|p| (p, RfmMetrics::of(p, now)))
        .collect();

    if gathered.is_empty() {
        log::debug!("rfm: empty population, nothing to score");
        return BTreeMap::new();
    }

    let scales = RfmScales::from_metrics(gathered.iter().map(|(_, m)| m));

    // Phase 2: independent per-customer scoring.
    let records: BTreeMap<CustomerKey, RfmRecord> = gathered
        .into_iter()
        .map(|(profile, metrics)| {
            let (r, f, m) = scales.score(&metrics);
            let segment = classify_scores(r, f, m);
            let record = RfmRecord {
                customer_key: profile.customer_key.clone(),
                recency_days: metrics.recency_days,
                frequency:    metrics.frequency,
                monetary:     metrics.monetary,
                r_score:      r,
                f_score:      f,
                m_score:      m,
                rfm_code:     rfm_code(r, f, m),
                segment:      segment.name.to_string(),
            };
            (profile.customer_key.clone(), record)
        })
        .collect();

    log::debug!("rfm: scored {} customers", records.len());
    records
}
