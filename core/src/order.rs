//! Order records — the engine's only input.
//!
//! Orders arrive from a feed already filtered to paid financial states.
//! The engine never mutates them. Raw text rows (as stored by storefront
//! exports) are parsed here; a bad amount or timestamp is a typed error,
//! a missing customer key is not.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{CustomerKey, Timestamp},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// `None` (or blank) when the storefront recorded no customer identity.
    pub customer_key: Option<CustomerKey>,
    pub occurred_at:  Timestamp,
    pub amount:       f64,
}

impl Order {
    pub fn new(customer_key: impl Into<CustomerKey>, occurred_at: Timestamp, amount: f64) -> Self {
        Self {
            customer_key: Some(customer_key.into()),
            occurred_at,
            amount,
        }
    }

    /// `new`, rejecting amounts `parse_amount` would reject.
    pub fn try_new(
        customer_key: impl Into<CustomerKey>,
        occurred_at: Timestamp,
        amount: f64,
    ) -> AnalyticsResult<Self> {
        Self::new(customer_key, occurred_at, amount).validated()
    }

    /// Pass the order through if its amount is finite and non-negative.
    pub fn validated(self) -> AnalyticsResult<Self> {
        check_amount(self.amount, &self.amount.to_string())?;
        Ok(self)
    }

    /// An order with no customer identity. The aggregator discards these.
    pub fn anonymous(occurred_at: Timestamp, amount: f64) -> Self {
        Self { customer_key: None, occurred_at, amount }
    }

    /// The trimmed customer key, or `None` if absent or blank.
    pub fn key(&self) -> Option<&str> {
        self.customer_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// An order as it comes out of a text source: every field still a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    pub customer_key: Option<String>,
    pub occurred_at:  String,
    pub amount:       String,
}

impl RawOrder {
    pub fn parse(&self) -> AnalyticsResult<Order> {
        Ok(Order {
            customer_key: self.customer_key.clone(),
            occurred_at:  parse_timestamp(&self.occurred_at)?,
            amount:       parse_amount(&self.amount)?,
        })
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> AnalyticsResult<Timestamp> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(crate::clock::start_of_day(date));
    }
    Err(AnalyticsError::InvalidTimestamp { raw: raw.to_string() })
}

/// A finite, non-negative decimal. Empty strings count as zero,
/// matching storefront exports that leave `total_price` blank on free orders.
pub fn parse_amount(raw: &str) -> AnalyticsResult<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = s.parse().map_err(|_| AnalyticsError::InvalidAmount {
        raw:    raw.to_string(),
        reason: "not a number".into(),
    })?;
    check_amount(value, raw)
}

fn check_amount(value: f64, raw: &str) -> AnalyticsResult<f64> {
    if !value.is_finite() {
        return Err(AnalyticsError::InvalidAmount {
            raw:    raw.to_string(),
            reason: "not finite".into(),
        });
    }
    if value < 0.0 {
        return Err(AnalyticsError::InvalidAmount {
            raw:    raw.to_string(),
            reason: "negative".into(),
        });
    }
    Ok(value)
}
