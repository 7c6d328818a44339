//! Customer aggregation — one profile per customer key.
//!
//! Single pass over the feed with hash-map accumulation. Orders for the
//! same customer may arrive in any temporal order; first/last order
//! dates are true min/max, not first/last seen.

use crate::{
    clock::days_between,
    cohort::{assign_cohort, CohortPeriod},
    order::Order,
    types::{CohortLabel, CustomerKey, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_key:   CustomerKey,
    pub first_order_at: Timestamp,
    pub last_order_at:  Timestamp,
    /// Arrival order. Never empty.
    pub orders:         Vec<Order>,
    pub total_spent:    f64,
}

impl CustomerProfile {
    fn open(key: CustomerKey, order: Order) -> Self {
        Self {
            customer_key:   key,
            first_order_at: order.occurred_at,
            last_order_at:  order.occurred_at,
            total_spent:    order.amount,
            orders:         vec![order],
        }
    }

    fn absorb(&mut self, order: Order) {
        if order.occurred_at < self.first_order_at {
            self.first_order_at = order.occurred_at;
        }
        if order.occurred_at > self.last_order_at {
            self.last_order_at = order.occurred_at;
        }
        self.total_spent += order.amount;
        self.orders.push(order);
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn avg_order_value(&self) -> f64 {
        self.total_spent / self.orders.len() as f64
    }

    /// Whole days since the last order at `now`, clamped to 0 for
    /// future-dated orders.
    pub fn recency_days(&self, now: Timestamp) -> i64 {
        days_between(self.last_order_at, now)
    }

    /// The acquisition cohort. Derived only from `first_order_at`, so it
    /// cannot change within a run.
    pub fn cohort(&self, period: CohortPeriod) -> CohortLabel {
        assign_cohort(self.first_order_at, period)
    }
}

/// The aggregator's output: profiles keyed by customer, plus how many
/// orders were dropped for lacking a customer key.
#[derive(Debug, Clone, Default)]
pub struct CustomerMap {
    profiles:         HashMap<CustomerKey, CustomerProfile>,
    pub orders_seen:  usize,
    pub discarded:    usize,
}

impl CustomerMap {
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CustomerProfile> {
        self.profiles.get(key)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &CustomerProfile> {
        self.profiles.values()
    }

    /// Profiles ordered by customer key, for stable output rows.
    pub fn sorted(&self) -> Vec<&CustomerProfile> {
        let mut out: Vec<_> = self.profiles.values().collect();
        out.sort_by(|a, b| a.customer_key.cmp(&b.customer_key));
        out
    }

    pub fn total_spent(&self) -> f64 {
        self.profiles.values().map(|p| p.total_spent).sum()
    }

    /// Keep only profiles matching `keep`. Used by cohort filtering.
    pub fn retain(&mut self, mut keep: impl FnMut(&CustomerProfile) -> bool) {
        self.profiles.retain(|_, p| keep(p));
    }
}

// ── Aggregation ──────────────────────────────────────────────────────────────

pub fn aggregate_customers<I>(orders: I) -> CustomerMap
where
    I: IntoIterator<Item = Order>,
{
    let mut map = CustomerMap::default();

    for order in orders {
        map.orders_seen += 1;

        let key = match order.key() {
            Some(k) => k.to_string(),
            None => {
                map.discarded += 1;
                log::debug!(
                    "aggregate: dropping order at {} without customer key",
                    order.occurred_at
                );
                continue;
            }
        };

        match map.profiles.get_mut(&key) {
            Some(profile) => profile.absorb(order),
            None => {
                map.profiles.insert(key.clone(), CustomerProfile::open(key, order));
            }
        }
    }

    if map.discarded > 0 {
        log::warn!(
            "aggregate: discarded {} of {} orders with no customer key",
            map.discarded,
            map.orders_seen
        );
    }
    log::debug!(
        "aggregate: {} orders → {} customers",
        map.orders_seen,
        map.profiles.len()
    );

    map
}
