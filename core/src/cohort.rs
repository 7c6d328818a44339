//! Cohort assignment — bucket customers by first-order period.
//!
//! Monthly labels look like `2024-03`. Weekly labels look like `2024-W09`
//! and use a simple Sunday-anchored week count, NOT ISO-8601 weeks:
//!
//!   week = ceil((days_since_jan1 + weekday_of_jan1 + 1) / 7)
//!
//! where `weekday_of_jan1` counts from Sunday = 0. Week 1 is the partial
//! week containing 1 January, and the year is always the order's own year.

use crate::{
    clock::add_months,
    customer::CustomerProfile,
    error::{AnalyticsError, AnalyticsResult},
    types::{CohortLabel, Timestamp},
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortPeriod {
    #[default]
    Monthly,
    Weekly,
}

impl fmt::Display for CohortPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly => f.write_str("monthly"),
            Self::Weekly  => f.write_str("weekly"),
        }
    }
}

impl FromStr for CohortPeriod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "weekly"  => Ok(Self::Weekly),
            other     => Err(AnalyticsError::UnknownPeriod { period: other.to_string() }),
        }
    }
}

pub fn assign_cohort(first_order_at: Timestamp, period: CohortPeriod) -> CohortLabel {
    let date = first_order_at.date_naive();
    match period {
        CohortPeriod::Monthly => format!("{}-{:02}", date.year(), date.month()),
        CohortPeriod::Weekly  => format!("{}-W{:02}", date.year(), week_of_year(date)),
    }
}

/// Sunday-anchored week number in `1..=54`.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let jan1_offset = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (date.ordinal0() + jan1_offset + 1).div_ceil(7)
}

/// The date a cohort's maturity windows are measured from.
///
/// Monthly cohorts start on the 1st of their month. Weekly cohorts are
/// mapped to the 1st of month `ceil(week / 4)`; weeks 49+ roll into
/// January/February of the following year.
pub fn cohort_start_date(label: &str) -> AnalyticsResult<NaiveDate> {
    let invalid = || AnalyticsError::InvalidCohortLabel { label: label.to_string() };

    let (year_part, rest) = label.split_once('-').ok_or_else(invalid)?;
    if year_part.len() != 4 {
        return Err(invalid());
    }
    let year: i32 = year_part.parse().map_err(|_| invalid())?;

    let month = match rest.strip_prefix('W') {
        Some(week_part) => {
            let week: u32 = week_part.parse().map_err(|_| invalid())?;
            if !(1..=54).contains(&week) {
                return Err(invalid());
            }
            week.div_ceil(4)
        }
        None => {
            if rest.len() != 2 {
                return Err(invalid());
            }
            let month: u32 = rest.parse().map_err(|_| invalid())?;
            if !(1..=12).contains(&month) {
                return Err(invalid());
            }
            month
        }
    };

    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    add_months(jan1, month - 1).ok_or_else(invalid)
}

/// True for weekly labels.
pub fn is_weekly_label(label: &str) -> bool {
    label.contains('W')
}

/// Group profiles by cohort label, ordered by label.
pub fn group_by_cohort<'a, I>(
    profiles: I,
    period: CohortPeriod,
) -> BTreeMap<CohortLabel, Vec<&'a CustomerProfile>>
where
    I: IntoIterator<Item = &'a CustomerProfile>,
{
    let mut groups: BTreeMap<CohortLabel, Vec<&'a CustomerProfile>> = BTreeMap::new();
    for profile in profiles {
        groups.entry(profile.cohort(period)).or_default().push(profile);
    }
    groups
}
