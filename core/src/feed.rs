//! Order feeds — where a run's orders come from.
//!
//! RULE: The engine never fetches data itself. A feed is fully
//! materialized before analysis starts; nothing inside a run blocks on I/O.

use crate::{error::AnalyticsResult, order::Order};

/// The contract every order source fulfills.
pub trait OrderFeed {
    /// Stable name for logs and reports, usually the business id.
    fn name(&self) -> &str;

    /// All paid orders for this business. Orders without a customer
    /// key are passed through; the aggregator drops and counts them.
    fn fetch_orders(&mut self) -> AnalyticsResult<Vec<Order>>;
}

/// An already-fetched list of orders.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    name:   String,
    orders: Vec<Order>,
}

impl StaticFeed {
    pub fn new(name: impl Into<String>, orders: Vec<Order>) -> Self {
        Self { name: name.into(), orders }
    }
}

impl OrderFeed for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_orders(&mut self) -> AnalyticsResult<Vec<Order>> {
        Ok(self.orders.clone())
    }
}
