//! Analysis report — the plain data handed to reporting and export.
//!
//! Everything here is already computed; the report layer only reads it.

use crate::{
    cohort::CohortPeriod,
    insight::Insight,
    retention::{CohortMetrics, RetentionWindow},
    rfm::RfmRecord,
    segment::SegmentStats,
    types::{RunId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id:            RunId,
    pub business:          String,
    /// The run's `now` snapshot.
    pub generated_at:      Timestamp,
    pub period:            CohortPeriod,
    pub cohort_filter:     Option<String>,
    pub orders_seen:       usize,
    pub orders_discarded:  usize,
    pub total_customers:   usize,
    pub total_revenue:     f64,
    /// One row per customer, ordered by customer key.
    pub rfm:               Vec<RfmRecord>,
    pub segments:          Vec<SegmentStats>,
    pub recommendations:   Vec<String>,
    /// Most recent cohort first.
    pub cohorts:           Vec<CohortMetrics>,
    pub overall_retention: BTreeMap<RetentionWindow, f64>,
    pub insights:          Vec<Insight>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.total_customers == 0
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentStats> {
        self.segments.iter().find(|s| s.segment == name)
    }

    pub fn cohort(&self, label: &str) -> Option<&CohortMetrics> {
        self.cohorts.iter().find(|c| c.cohort_label == label)
    }

    pub fn to_json_pretty(&self) -> crate::error::AnalyticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
