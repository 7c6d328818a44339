//! Customer behavioral analytics: RFM segmentation and cohort retention
//! computed from a business's paid order history.
//!
//! The algorithmic modules (`customer`, `cohort`, `rfm`, `segment`,
//! `retention`, `insight`) are pure functions over in-memory data.
//! `engine` runs them in order; `feed`, `store` and `synthetic` supply
//! orders.

pub mod clock;
pub mod cohort;
pub mod config;
pub mod customer;
pub mod engine;
pub mod error;
pub mod feed;
pub mod insight;
pub mod order;
pub mod report;
pub mod retention;
pub mod rfm;
pub mod rng;
pub mod segment;
pub mod store;
pub mod synthetic;
pub mod types;

pub use clock::RunClock;
pub use cohort::{assign_cohort, CohortPeriod};
pub use config::AnalyticsConfig;
pub use customer::{aggregate_customers, CustomerMap, CustomerProfile};
pub use engine::{AnalyticsEngine, RunOptions};
pub use error::{AnalyticsError, AnalyticsResult};
pub use insight::{compute_overall_retention, generate_insights, Insight};
pub use order::Order;
pub use report::AnalysisReport;
pub use retention::{compute_cohort_metrics, CohortMetrics, RetentionWindow};
pub use rfm::{score_population, RfmRecord};
pub use segment::{classify_segment, SegmentInfo};
