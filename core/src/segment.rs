//! Segment classification — RFM triple → named segment.
//!
//! RULE: `SEGMENT_RULES` is evaluated top to bottom and the first match
//! wins. Several rules overlap on edge codes (e.g. `111` matches both
//! Hibernating and Lost), so declaration order IS the priority order.
//! Never sort or reorder the table.
//!
//! Codes no rule covers fall through to `fallback_segment`, which is
//! total, so every code in {1..5}³ resolves to exactly one segment.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    rfm::RfmRecord,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::RangeInclusive};

// ── Rule table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentInfo {
    pub name:        &'static str,
    pub description: &'static str,
    pub action:      &'static str,
}

#[derive(Debug, Clone)]
pub struct SegmentRule {
    pub info: SegmentInfo,
    pub r:    RangeInclusive<u8>,
    pub f:    RangeInclusive<u8>,
    pub m:    RangeInclusive<u8>,
}

impl SegmentRule {
    pub fn matches(&self, r: u8, f: u8, m: u8) -> bool {
        self.r.contains(&r) && self.f.contains(&f) && self.m.contains(&m)
    }
}

pub const CHAMPIONS: &str = "Champions";
pub const LOYAL_CUSTOMERS: &str = "Loyal Customers";
pub const POTENTIAL_LOYALISTS: &str = "Potential Loyalists";
pub const NEW_CUSTOMERS: &str = "New Customers";
pub const PROMISING: &str = "Promising";
pub const NEED_ATTENTION: &str = "Need Attention";
pub const ABOUT_TO_SLEEP: &str = "About to Sleep";
pub const AT_RISK: &str = "At Risk";
pub const CANT_LOSE_THEM: &str = "Can't Lose Them";
pub const HIBERNATING: &str = "Hibernating";
pub const LOST: &str = "Lost";
pub const RECENT_CUSTOMER: &str = "Recent Customer";
pub const AVERAGE: &str = "Average";

const fn rule(
    name: &'static str,
    r: RangeInclusive<u8>,
    f: RangeInclusive<u8>,
    m: RangeInclusive<u8>,
    description: &'static str,
    action: &'static str,
) -> SegmentRule {
    SegmentRule { info: SegmentInfo { name, description, action }, r, f, m }
}

pub static SEGMENT_RULES: [SegmentRule; 11] = [
    rule(CHAMPIONS, 4..=5, 4..=5, 4..=5,
        "Best customers - buy often, recently, and spend most",
        "Reward with loyalty program, ask for reviews, upsell premium"),
    rule(LOYAL_CUSTOMERS, 3..=5, 4..=5, 3..=4,
        "Consistent buyers with good spending",
        "Upsell higher value products, engage with loyalty rewards"),
    rule(POTENTIAL_LOYALISTS, 4..=5, 2..=3, 2..=3,
        "Recent customers with moderate engagement",
        "Offer membership, recommend other products, engage"),
    rule(NEW_CUSTOMERS, 4..=5, 1..=1, 1..=3,
        "Bought most recently but only once",
        "Provide onboarding, early engagement, second purchase incentive"),
    rule(PROMISING, 3..=4, 1..=1, 1..=2,
        "Recent shoppers with low frequency",
        "Create brand awareness, offer trials"),
    rule(NEED_ATTENTION, 2..=3, 2..=3, 2..=3,
        "Average in all dimensions, risk of drifting away",
        "Reactivate with limited offers, personalized recommendations"),
    rule(ABOUT_TO_SLEEP, 2..=3, 1..=2, 1..=2,
        "Below average recency and frequency",
        "Win back with targeted campaign, new product launch"),
    rule(AT_RISK, 1..=2, 3..=4, 3..=4,
        "Spent and bought often but long time ago",
        "Urgent reactivation, personalized offers, feedback request"),
    rule(CANT_LOSE_THEM, 1..=2, 4..=5, 4..=5,
        "Made biggest purchases but haven't returned",
        "Win back urgently, personal outreach, exclusive offers"),
    rule(HIBERNATING, 1..=2, 1..=2, 1..=2,
        "Low in all dimensions",
        "Offer relevant products, special discounts to re-engage"),
    rule(LOST, 1..=1, 1..=1, 1..=2,
        "Lowest recency, frequency, and monetary",
        "Try winback campaign, otherwise deprioritize"),
];

const RECENT_CUSTOMER_INFO: SegmentInfo = SegmentInfo {
    name:        RECENT_CUSTOMER,
    description: "Bought recently but outside the core segment patterns",
    action:      "Encourage a repeat purchase with a personalised follow-up",
};

const AVERAGE_INFO: SegmentInfo = SegmentInfo {
    name:        AVERAGE,
    description: "No strong signal in any dimension",
    action:      "Keep in regular newsletter rotation",
};

// ── Classification ───────────────────────────────────────────────────────────

/// Classify an already-validated score triple. Total over {1..5}³.
pub fn classify_scores(r: u8, f: u8, m: u8) -> SegmentInfo {
    debug_assert!(
        [r, f, m].iter().all(|s| (1..=5).contains(s)),
        "score out of range: {r}{f}{m}"
    );
    SEGMENT_RULES
        .iter()
        .find(|rule| rule.matches(r, f, m))
        .map(|rule| rule.info)
        .unwrap_or_else(|| fallback_segment(r, f))
}

/// Heuristic for codes the rule table does not cover.
fn fallback_segment(r: u8, f: u8) -> SegmentInfo {
    if r >= 4 {
        RECENT_CUSTOMER_INFO
    } else if r <= 2 && f >= 3 {
        segment_info(AT_RISK).unwrap_or(AVERAGE_INFO)
    } else {
        AVERAGE_INFO
    }
}

/// Classify a three-digit code such as `"543"`.
pub fn classify_segment(rfm_code: &str) -> AnalyticsResult<SegmentInfo> {
    let (r, f, m) = parse_rfm_code(rfm_code)?;
    Ok(classify_scores(r, f, m))
}

pub fn parse_rfm_code(code: &str) -> AnalyticsResult<(u8, u8, u8)> {
    let invalid = || AnalyticsError::InvalidRfmCode { code: code.to_string() };
    let digits: Vec<u8> = code
        .chars()
        .map(|c| match c {
            '1'..='5' => Ok(c as u8 - b'0'),
            _ => Err(invalid()),
        })
        .collect::<AnalyticsResult<_>>()?;
    match digits.as_slice() {
        [r, f, m] => Ok((*r, *f, *m)),
        _ => Err(invalid()),
    }
}

/// Static lookup of a segment's description and action by name,
/// including the fallback segments.
pub fn segment_info(name: &str) -> Option<SegmentInfo> {
    SEGMENT_RULES
        .iter()
        .map(|rule| rule.info)
        .chain([RECENT_CUSTOMER_INFO, AVERAGE_INFO])
        .find(|info| info.name == name)
}

// ── Segment statistics ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub segment:          String,
    pub count:            usize,
    /// Share of the scored population, 0–100.
    pub percentage:       f64,
    pub avg_recency_days: f64,
    pub avg_frequency:    f64,
    pub avg_monetary:     f64,
    pub total_revenue:    f64,
}

/// Per-segment rollup, highest total revenue first.
pub fn segment_stats<'a, I>(records: I) -> Vec<SegmentStats>
where
    I: IntoIterator<Item = &'a RfmRecord>,
{
    #[derive(Default)]
    struct Acc {
        count:    usize,
        recency:  i64,
        orders:   usize,
        revenue:  f64,
    }

    let mut by_segment: HashMap<&str, Acc> = HashMap::new();
    let mut total = 0usize;
    for rec in records {
        total += 1;
        let acc = by_segment.entry(rec.segment.as_str()).or_default();
        acc.count += 1;
        acc.recency += rec.recency_days;
        acc.orders += rec.frequency;
        acc.revenue += rec.monetary;
    }

    let mut stats: Vec<SegmentStats> = by_segment
        .into_iter()
        .map(|(segment, acc)| {
            let n = acc.count as f64;
            SegmentStats {
                segment:          segment.to_string(),
                count:            acc.count,
                percentage:       100.0 * n / total as f64,
                avg_recency_days: acc.recency as f64 / n,
                avg_frequency:    acc.orders as f64 / n,
                avg_monetary:     acc.revenue / n,
                total_revenue:    acc.revenue,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_revenue
            .total_cmp(&a.total_revenue)
            .then_with(|| a.segment.cmp(&b.segment))
    });
    stats
}
