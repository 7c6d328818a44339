//! Analysis configuration.
//!
//! Loaded from `{data_dir}/analytics/analytics_config.json`. Every field
//! has a default equal to the constants the reports were calibrated on,
//! so a partial file only overrides what it names.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    retention::{DEFAULT_CHURN_DAYS, DEFAULT_WINDOWS, MAX_CHURN_DAYS},
};
use serde::{Deserialize, Serialize};

// ── Insight thresholds ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// How many most-recent cohorts are compared against the same number
    /// of older ones.
    pub recent_cohort_count: usize,
    /// Relative LTV change that counts as a shift (0.20 = 20%).
    pub ltv_shift_ratio: f64,
    /// Month-1 minus month-3 retention, in percentage points.
    pub early_churn_dropoff_points: f64,
    /// Monthly cohorts required before checking Q4 seasonality.
    pub seasonal_min_monthly_cohorts: usize,
    pub seasonal_ltv_ratio: f64,
    /// Cohorts whose churn rate exceeds this percentage are flagged.
    pub high_churn_rate_pct: u32,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            recent_cohort_count:          3,
            ltv_shift_ratio:              0.20,
            early_churn_dropoff_points:   30.0,
            seasonal_min_monthly_cohorts: 12,
            seasonal_ltv_ratio:           0.20,
            high_churn_rate_pct:          50,
        }
    }
}

// ── Segment recommendation thresholds ──────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Population share (0–100) of At Risk / Can't Lose Them that
    /// triggers a win-back recommendation.
    pub at_risk_share_pct: f64,
    pub hibernating_share_pct: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            at_risk_share_pct:     10.0,
            hibernating_share_pct: 20.0,
        }
    }
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Maturity windows in months.
    pub retention_windows: Vec<u32>,
    /// Single-order customers silent for longer than this are churned.
    pub churn_inactivity_days: i64,
    pub insights: InsightThresholds,
    pub recommendations: RecommendationThresholds,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            retention_windows:     DEFAULT_WINDOWS.to_vec(),
            churn_inactivity_days: DEFAULT_CHURN_DAYS,
            insights:              InsightThresholds::default(),
            recommendations:       RecommendationThresholds::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load from the data/ directory.
    /// In tests, use AnalyticsConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/analytics/analytics_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Invalid {path}: {e}"))?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> AnalyticsResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.retention_windows.is_empty() {
            return Err(AnalyticsError::InvalidConfig {
                reason: "retention_windows must not be empty".into(),
            });
        }
        if self.retention_windows.contains(&0) {
            return Err(AnalyticsError::InvalidConfig {
                reason: "retention windows must be at least 1 month".into(),
            });
        }
        if !(1..=MAX_CHURN_DAYS).contains(&self.churn_inactivity_days) {
            return Err(AnalyticsError::InvalidConfig {
                reason: format!(
                    "churn_inactivity_days must be in 1..={MAX_CHURN_DAYS}, got {}",
                    self.churn_inactivity_days
                ),
            });
        }
        if self.insights.recent_cohort_count == 0 {
            return Err(AnalyticsError::InvalidConfig {
                reason: "insights.recent_cohort_count must be at least 1".into(),
            });
        }
        Ok(())
    }
}
