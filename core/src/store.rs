//! SQLite order store — a local source of paid orders.
//!
//! RULE: Only store.rs talks to the database.
//! The store hands out parsed `Order`s; analytics code never sees SQL.
//! Results are never written back.

use crate::{
    error::AnalyticsResult,
    feed::OrderFeed,
    order::{Order, RawOrder},
};
use rusqlite::{params, Connection};

/// Financial states that count as a completed purchase.
pub const PAID_STATUSES: [&str; 2] = ["paid", "partially_paid"];

/// One row of the `orders` table, text columns as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order_id:         String,
    pub business:         String,
    pub customer_email:   Option<String>,
    pub processed_at:     String,
    pub total_price:      Option<String>,
    pub financial_status: String,
}

pub struct OrderStore {
    conn: Connection,
}

impl OrderStore {
    /// Open (or create) the order database at `path`.
    pub fn open(path: &str) -> AnalyticsResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnalyticsResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AnalyticsResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_orders.sql"))?;
        Ok(())
    }

    // ── Orders ─────────────────────────────────────────────────

    pub fn insert_order(&self, order: &StoredOrder) -> AnalyticsResult<()> {
        self.conn.execute(
            "INSERT INTO orders (
                order_id, business, customer_email, processed_at, total_price, financial_status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(business, order_id) DO UPDATE SET
                customer_email   = excluded.customer_email,
                processed_at     = excluded.processed_at,
                total_price      = excluded.total_price,
                financial_status = excluded.financial_status",
            params![
                order.order_id,
                order.business,
                order.customer_email,
                order.processed_at,
                order.total_price,
                order.financial_status,
            ],
        )?;
        Ok(())
    }

    pub fn order_count(&self, business: &str) -> AnalyticsResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE business = ?1",
            params![business],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Distinct businesses with at least one order, sorted.
    pub fn businesses(&self) -> AnalyticsResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT business FROM orders ORDER BY business ASC"
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Paid and partially paid orders for `business`, oldest first.
    /// A row with an unparseable price or timestamp fails the whole load.
    pub fn paid_orders(&self, business: &str) -> AnalyticsResult<Vec<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_email, processed_at, COALESCE(total_price, '')
             FROM orders
             WHERE business = ?1 AND financial_status IN (?2, ?3)
             ORDER BY processed_at ASC, order_id ASC"
        )?;
        let raw = stmt
            .query_map(params![business, PAID_STATUSES[0], PAID_STATUSES[1]], |row| {
                Ok(RawOrder {
                    customer_key: row.get(0)?,
                    occurred_at:  row.get(1)?,
                    amount:       row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.iter().map(RawOrder::parse).collect()
    }
}

/// Feed adapter over one business's rows in an `OrderStore`.
pub struct SqliteOrderFeed<'a> {
    store:    &'a OrderStore,
    business: String,
}

impl<'a> SqliteOrderFeed<'a> {
    pub fn new(store: &'a OrderStore, business: impl Into<String>) -> Self {
        Self { store, business: business.into() }
    }
}

impl OrderFeed for SqliteOrderFeed<'_> {
    fn name(&self) -> &str {
        &self.business
    }

    fn fetch_orders(&mut self) -> AnalyticsResult<Vec<Order>> {
        let orders = self.store.paid_orders(&self.business)?;
        log::debug!("store: loaded {} paid orders for {}", orders.len(), self.business);
        Ok(orders)
    }
}
