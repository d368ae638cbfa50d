//! metrics-runner: batch metrics runner over a retail transaction store.
//!
//! Usage:
//!   metrics-runner --db shop.db --tenant shop-1 --today 2024-06-01
//!   metrics-runner --generate --seed 42 --customers 200 --days 365
//!   metrics-runner --generate --json

mod gen;

use anyhow::Result;
use chrono::NaiveDate;
use retail_metrics_core::{
    config::EngineConfig,
    engine::{AggregateRunSummary, MetricsEngine, RunSummary},
    store::MetricsStore,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let tenant = string_arg(&args, "--tenant").unwrap_or_else(|| "demo".to_string());
    let db = string_arg(&args, "--db").unwrap_or_else(|| ":memory:".to_string());
    let generate = args.iter().any(|a| a == "--generate");
    let json_output = args.iter().any(|a| a == "--json");
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", 200usize);
    let days = parse_arg(&args, "--days", 365i64);

    let mut config = match string_arg(&args, "--config") {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    if let Some(today) = string_arg(&args, "--today") {
        config.today = NaiveDate::parse_from_str(&today, "%Y-%m-%d")?;
    }

    if !json_output {
        println!("metrics-runner");
        println!("  tenant: {tenant}");
        println!("  db:     {db}");
        println!("  today:  {}", config.today);
        println!();
    }

    // For :memory: use a SQLite shared-memory URI so reopening within
    // the process would see the same database.
    let db_effective = if db == ":memory:" {
        format!("file:metrics_{}?mode=memory&cache=shared", std::process::id())
    } else {
        db.clone()
    };
    let store = MetricsStore::open(&db_effective)?;
    store.migrate()?;

    if generate {
        let params = gen::GenParams { seed, customers, days, today: config.today };
        gen::generate(&store, &tenant, &params)?;
    }

    let engine = MetricsEngine::new(store, tenant, config);

    let customer_summary = engine.recompute_customer_metrics()?;
    let product_summary = engine.recompute_product_analytics()?;
    let discount_summary = engine.recompute_discount_analytics()?;
    let time_summary = engine.recompute_time_analytics()?;

    if json_output {
        let report = serde_json::json!({
            "customers": customer_summary,
            "product_analytics": product_summary,
            "discount_analytics": discount_summary,
            "time_analytics": time_summary,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_customer_summary(&customer_summary);
        print_aggregate_summary("product", &product_summary);
        print_aggregate_summary("discount", &discount_summary);
        print_aggregate_summary("time", &time_summary);
    }

    Ok(())
}

fn print_customer_summary(summary: &RunSummary) {
    println!("=== CUSTOMER METRICS ===");
    println!("  status:    {:?}", summary.status);
    println!("  customers: {}", summary.customers);
    println!("  errors:    {}", summary.errors);
    println!("  duration:  {:.2}s", summary.duration_seconds);
    for failure in &summary.failures {
        println!("  failed {} : {}", failure.customer_id, failure.error);
    }
    println!();
}

fn print_aggregate_summary(family: &str, summary: &AggregateRunSummary) {
    println!("=== {} ANALYTICS ===", family.to_uppercase());
    println!("  status:   {:?}", summary.status);
    println!("  metrics:  {}", summary.metrics_computed);
    println!("  errors:   {}", summary.errors);
    println!("  duration: {:.2}s", summary.duration_seconds);
    for failure in &summary.failures {
        println!("  failed {} : {}", failure.metric_name, failure.error);
    }
    println!();
}

fn string_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
