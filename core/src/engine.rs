//! The analytics engine — one full run over one business's orders.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Aggregate orders into customer profiles
//!   2. Apply the optional cohort filter
//!   3. Group by cohort, compute cohort metrics
//!   4. Score the population (RFM) and classify segments
//!   5. Segment statistics and recommendations
//!   6. Overall retention and insights
//!
//! RULES:
//!   - `now` comes from the caller's RunClock, captured once.
//!   - Each stage consumes only the complete output of earlier stages.
//!   - A run owns everything it allocates; runs share no state.

use crate::{
    clock::RunClock,
    cohort::{group_by_cohort, CohortPeriod},
    config::AnalyticsConfig,
    customer::aggregate_customers,
    error::AnalyticsResult,
    feed::OrderFeed,
    insight::{compute_overall_retention, generate_insights, generate_segment_recommendations},
    order::Order,
    report::AnalysisReport,
    retention::compute_cohort_metrics,
    rfm::score_population,
    segment::segment_stats,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub period:        CohortPeriod,
    /// Restrict the run to customers acquired in this cohort.
    pub cohort_filter: Option<String>,
}

impl RunOptions {
    pub fn monthly() -> Self {
        Self::default()
    }

    pub fn weekly() -> Self {
        Self { period: CohortPeriod::Weekly, ..Self::default() }
    }

    pub fn with_cohort(mut self, label: impl Into<String>) -> Self {
        self.cohort_filter = Some(label.into());
        self
    }
}

pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Fetch from `feed`, then analyze.
    pub fn run_feed(
        &self,
        feed: &mut dyn OrderFeed,
        clock: &RunClock,
        options: &RunOptions,
    ) -> AnalyticsResult<AnalysisReport> {
        let orders = feed.fetch_orders()?;
        let business = feed.name().to_string();
        self.run(&business, orders, clock, options)
    }

    pub fn run<I>(
        &self,
        business: &str,
        orders: I,
        clock: &RunClock,
        options: &RunOptions,
    ) -> AnalyticsResult<AnalysisReport>
    where
        I: IntoIterator<Item = Order>,
    {
        let now = clock.now();

        // 1. Aggregation (amounts checked first)
        let orders = orders
            .into_iter()
            .map(Order::validated)
            .collect::<AnalyticsResult<Vec<_>>>()?;
        let mut customers = aggregate_customers(orders);

        // 2. Cohort filter
        if let Some(label) = &options.cohort_filter {
            customers.retain(|p| &p.cohort(options.period) == label);
            if customers.is_empty() {
                log::warn!("run={} business={business}: no customers in cohort {label}", clock.run_id);
            }
        }
        let profiles = customers.sorted();

        // 3. Cohorts
        let by_cohort = group_by_cohort(profiles.iter().copied(), options.period);
        let cohorts = compute_cohort_metrics(
            &by_cohort,
            now,
            &self.config.retention_windows,
            self.config.churn_inactivity_days,
        )?;

        // 4. RFM
        let scored = score_population(profiles.iter().copied(), now);

        // 5. Segments
        let segments = segment_stats(scored.values());
        let recommendations =
            generate_segment_recommendations(&segments, &self.config.recommendations);

        // 6. Aggregates and insights
        let overall_retention = compute_overall_retention(&cohorts);
        let insights = generate_insights(&cohorts, &overall_retention, &self.config.insights);

        let report = AnalysisReport {
            run_id:            clock.run_id.clone(),
            business:          business.to_string(),
            generated_at:      now,
            period:            options.period,
            cohort_filter:     options.cohort_filter.clone(),
            orders_seen:       customers.orders_seen,
            orders_discarded:  customers.discarded,
            total_customers:   customers.len(),
            total_revenue:     customers.total_spent(),
            rfm:               scored.into_values().collect(),
            segments,
            recommendations,
            cohorts,
            overall_retention,
            insights,
        };

        log::info!(
            "run={} business={business}: {} orders, {} customers, {} cohorts, {} segments, {} insights",
            report.run_id,
            report.orders_seen,
            report.total_customers,
            report.cohorts.len(),
            report.segments.len(),
            report.insights.len(),
        );

        Ok(report)
    }
}
