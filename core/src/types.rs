//! Shared primitive types used across the analytics engine.

use chrono::{DateTime, Utc};

/// A point in time. All order timestamps and the run snapshot are UTC.
pub type Timestamp = DateTime<Utc>;

/// Stable customer identity within one business (usually an e-mail address).
pub type CustomerKey = String;

/// The canonical analysis run identifier.
pub type RunId = String;

/// A cohort label such as `2024-03` or `2024-W09`.
pub type CohortLabel = String;
