//! retention-runner: headless RFM + cohort retention report.
//!
//! Usage:
//!   retention-runner --db orders.db                      # every business in the db
//!   retention-runner --db orders.db --business teelixir --period weekly
//!   retention-runner --seed 42 --customers 500           # synthetic demo feed
//!   retention-runner --history-days 365 --repeat-probability 0.6
//!   retention-runner --db orders.db --cohort 2024-06 --json

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use retention_core::{
    config::AnalyticsConfig,
    engine::{AnalyticsEngine, RunOptions},
    feed::OrderFeed,
    insight::format_money,
    order::parse_timestamp,
    report::AnalysisReport,
    retention::RetentionWindow,
    segment::segment_info,
    store::{OrderStore, SqliteOrderFeed},
    synthetic::SyntheticFeed,
    RunClock,
};
use std::env;
use std::path::Path;

/// Cohort rows printed in the text report.
const MAX_COHORT_ROWS: usize = 24;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", 250usize);
    let history_days = parse_arg(&args, "--history-days", 730u64);
    let repeat_probability = parse_arg(&args, "--repeat-probability", 0.45f64);
    let json = args.iter().any(|a| a == "--json");
    let db = string_arg(&args, "--db");
    let business = string_arg(&args, "--business");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    let mut options = RunOptions::default();
    if let Some(period) = string_arg(&args, "--period") {
        options.period = period.parse()?;
    }
    options.cohort_filter = string_arg(&args, "--cohort").map(str::to_string);

    // One "now" for the whole invocation.
    let clock = match string_arg(&args, "--now") {
        Some(raw) => RunClock::fixed(parse_timestamp(raw)?),
        None => RunClock::capture(),
    };

    let config = load_config(data_dir)?;
    let engine = AnalyticsEngine::new(config)?;

    if !json {
        println!("retention-runner");
        println!("  run_id:    {}", clock.run_id);
        println!("  now:       {}", clock.now().to_rfc3339_opts(SecondsFormat::Secs, true));
        println!("  period:    {}", options.period);
        println!("  source:    {}", db.unwrap_or("synthetic"));
        println!();
    }

    let mut reports = Vec::new();
    match db {
        Some(path) => {
            let store = OrderStore::open(path)?;
            store.migrate()?;
            let businesses = match business {
                Some(b) => vec![b.to_string()],
                None => store.businesses()?,
            };
            if businesses.is_empty() {
                log::warn!("No orders found in {path}");
            }
            for b in businesses {
                let mut feed = SqliteOrderFeed::new(&store, b);
                reports.push(run_one(&engine, &mut feed, &clock, &options)?);
            }
        }
        None => {
            let mut feed = SyntheticFeed::new(business.unwrap_or("demo"), seed, clock.now())
                .with_customers(customers)
                .with_history_days(history_days)
                .with_repeat_probability(repeat_probability);
            reports.push(run_one(&engine, &mut feed, &clock, &options)?);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report, &engine.config().retention_windows);
        }
    }

    Ok(())
}

fn run_one(
    engine: &AnalyticsEngine,
    feed: &mut dyn OrderFeed,
    clock: &RunClock,
    options: &RunOptions,
) -> Result<AnalysisReport> {
    let name = feed.name().to_string();
    engine
        .run_feed(feed, clock, options)
        .with_context(|| format!("analysis failed for business '{name}'"))
}

fn load_config(data_dir: &str) -> Result<AnalyticsConfig> {
    let path = format!("{data_dir}/analytics/analytics_config.json");
    if Path::new(&path).exists() {
        AnalyticsConfig::load(data_dir)
    } else {
        log::info!("{path} not found, using built-in defaults");
        Ok(AnalyticsConfig::default())
    }
}

fn print_report(report: &AnalysisReport, windows: &[u32]) {
    let rule = "=".repeat(100);
    println!("{rule}");
    println!("CUSTOMER ANALYTICS: {}", report.business.to_uppercase());
    println!("{rule}");
    if let Some(cohort) = &report.cohort_filter {
        println!("  cohort filter:   {cohort}");
    }
    println!("  orders:          {} ({} without customer)", report.orders_seen, report.orders_discarded);
    println!("  customers:       {}", report.total_customers);
    println!("  revenue:         ${}", format_money(report.total_revenue));
    println!();

    if report.is_empty() {
        println!("  (No customer data)");
        println!();
        return;
    }

    println!("--- SEGMENT BREAKDOWN ---");
    println!(
        "{:<22}{:>8}{:>8}{:>10}{:>12}{:>12}{:>14}",
        "Segment", "Count", "%", "Avg Days", "Avg Orders", "Avg Spent", "Total Rev"
    );
    println!("{}", "-".repeat(86));
    for s in &report.segments {
        println!(
            "{:<22}{:>8}{:>8}{:>10.0}{:>12.1}{:>12}{:>14}",
            truncate(&s.segment, 21),
            s.count,
            format!("{:.1}%", s.percentage),
            s.avg_recency_days,
            s.avg_frequency,
            format!("${}", format_money(s.avg_monetary)),
            format!("${}", format_money(s.total_revenue)),
        );
    }
    println!();

    if !report.recommendations.is_empty() {
        println!("--- RECOMMENDATIONS ---");
        for (i, rec) in report.recommendations.iter().enumerate() {
            println!("{}. {rec}", i + 1);
        }
        println!();
    }

    println!("--- SEGMENT ACTIONS ---");
    for s in &report.segments {
        if let Some(info) = segment_info(&s.segment) {
            println!("{}: {}", info.name, info.action);
        }
    }
    println!();

    println!("--- OVERALL RETENTION ---");
    println!(
        "  {}",
        report.overall_retention
            .keys()
            .map(|w| format!("{:>6}", w.to_string()))
            .collect::<String>()
    );
    println!(
        "  {}",
        report.overall_retention
            .values()
            .map(|r| format!("{:>6}", format!("{:.0}%", r)))
            .collect::<String>()
    );
    println!();

    println!("--- COHORT BREAKDOWN ({}) ---", report.period);
    let configured: Vec<RetentionWindow> = windows.iter().copied().map(RetentionWindow).collect();
    println!(
        "{:<10}{:>7}{:>12}{:>8}{:>7}{:>8}{:>7}{}",
        "Cohort", "Cust", "Revenue", "AOV", "Ord/C", "LTV", "Churn",
        configured.iter().map(|w| format!("{:>6}", w.to_string())).collect::<String>()
    );
    println!("{}", "-".repeat(100));
    for c in report.cohorts.iter().take(MAX_COHORT_ROWS) {
        let cells: String = configured
            .iter()
            .map(|w| match c.retention_rates.get(w) {
                Some(rate) => format!("{:>6}", format!("{rate}%")),
                None => format!("{:>6}", "-"),
            })
            .collect();
        println!(
            "{:<10}{:>7}{:>12}{:>8}{:>7.1}{:>8}{:>7}{cells}",
            c.cohort_label,
            c.customer_count,
            format!("${}", format_money(c.revenue)),
            format!("${}", format_money(c.avg_order_value)),
            c.avg_orders_per_customer,
            format!("${}", format_money(c.ltv)),
            format!("{}%", c.churn_rate),
        );
    }
    println!();

    if !report.insights.is_empty() {
        println!("--- INSIGHTS ---");
        for (i, insight) in report.insights.iter().enumerate() {
            println!("{}. {}", i + 1, insight.message);
        }
        println!();
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
