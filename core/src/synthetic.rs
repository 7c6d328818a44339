//! Synthetic order feed — seeded, reproducible demo data.
//!
//! Each customer gets a first order somewhere in the history window and
//! then keeps reordering with `repeat_probability`, each gap 7–120 days,
//! until the next order would land after `now`. Order values are
//! Pareto-distributed. A small share of orders carry no customer key so
//! the discard path is exercised too.

use crate::{
    error::AnalyticsResult,
    feed::OrderFeed,
    order::Order,
    rng::SeededRng,
    types::Timestamp,
};
use chrono::Duration;

const MIN_GAP_DAYS: u64 = 7;
const MAX_GAP_DAYS: u64 = 120;
const AMOUNT_X_MIN: f64 = 25.0;
const AMOUNT_ALPHA: f64 = 1.6;
const AMOUNT_CAP: f64 = 2_500.0;

#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    pub business:           String,
    pub seed:               u64,
    pub now:                Timestamp,
    pub customers:          usize,
    pub history_days:       u64,
    pub repeat_probability: f64,
    pub anonymous_rate:     f64,
}

impl SyntheticFeed {
    pub fn new(business: impl Into<String>, seed: u64, now: Timestamp) -> Self {
        Self {
            business: business.into(),
            seed,
            now,
            customers:          250,
            history_days:       730,
            repeat_probability: 0.45,
            anonymous_rate:     0.01,
        }
    }

    pub fn with_customers(mut self, customers: usize) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_history_days(mut self, days: u64) -> Self {
        self.history_days = days.max(1);
        self
    }

    pub fn with_repeat_probability(mut self, p: f64) -> Self {
        self.repeat_probability = p.clamp(0.0, 0.95);
        self
    }

    pub fn with_anonymous_rate(mut self, rate: f64) -> Self {
        self.anonymous_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Generate every order. Same configuration ⇒ same output.
    pub fn generate(&self) -> Vec<Order> {
        let mut rng = SeededRng::new(self.seed, SeededRng::stream_for(&self.business));
        let mut orders = Vec::new();
        let domain = self.business.to_ascii_lowercase().replace(' ', "-");

        for i in 0..self.customers {
            let key = format!("customer{i:05}@{domain}.example");
            let offset = rng.next_u64_below(self.history_days);
            let mut at = self.now - Duration::days(offset as i64);

            loop {
                let amount = round_cents(rng.pareto(AMOUNT_X_MIN, AMOUNT_ALPHA).min(AMOUNT_CAP));
                if rng.chance(self.anonymous_rate) {
                    orders.push(Order::anonymous(at, amount));
                } else {
                    orders.push(Order::new(key.clone(), at, amount));
                }

                if !rng.chance(self.repeat_probability) {
                    break;
                }
                let gap = MIN_GAP_DAYS + rng.next_u64_below(MAX_GAP_DAYS - MIN_GAP_DAYS + 1);
                at += Duration::days(gap as i64);
                if at > self.now {
                    break;
                }
            }
        }

        log::debug!(
            "synthetic: {} orders for {} customers (business={}, seed={})",
            orders.len(),
            self.customers,
            self.business,
            self.seed
        );
        orders
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl OrderFeed for SyntheticFeed {
    fn name(&self) -> &str {
        &self.business
    }

    fn fetch_orders(&mut self) -> AnalyticsResult<Vec<Order>> {
        Ok(self.generate())
    }
}
