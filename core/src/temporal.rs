//! Purchase-cadence metrics: inter-order gaps, expected next order,
//! regularity, and activity rate.

use crate::{config::EngineConfig, facts::TransactionFact, record::TemporalMetrics, stats};
use chrono::{Datelike, Duration};
use std::collections::BTreeSet;

pub fn compute_temporal(
    transactions: &[&TransactionFact],
    config: &EngineConfig,
) -> TemporalMetrics {
    let first_order = transactions[0].date;
    let last_order = transactions[transactions.len() - 1].date;
    let today = config.today.and_hms_opt(0, 0, 0).expect("midnight is valid");

    let age_days = (today - first_order).num_days();
    let age_months = age_days / 30;

    // Whole-day gaps between consecutive orders. A single-order history
    // has no gaps; the customer's age stands in with zero spread.
    let gaps: Vec<f64> = transactions
        .windows(2)
        .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
        .collect();

    let (avg_days, median_days, std_days) = if gaps.is_empty() {
        (age_days as f64, age_days as f64, 0.0)
    } else {
        let std = if gaps.len() > 1 { stats::population_std(&gaps) } else { 0.0 };
        (stats::mean(&gaps), stats::median(&gaps), std)
    };

    let expected_next = last_order + Duration::seconds((avg_days * 86_400.0) as i64);
    let days_overdue = (today - expected_next).num_days().max(0);

    // Coefficient-of-variation score in (0, 1]; 1 = perfectly regular.
    let purchase_regularity = if avg_days > 0.0 {
        1.0 / (1.0 + std_days / avg_days)
    } else {
        0.0
    };

    let months: BTreeSet<(i32, u32)> = transactions
        .iter()
        .map(|t| (t.date.year(), t.date.month()))
        .collect();
    let active_months = months.len() as i64;
    let activity_rate = active_months as f64 / age_months.max(1) as f64;

    TemporalMetrics {
        customer_age_days: age_days,
        customer_age_months: age_months,
        avg_days_between: avg_days,
        median_days_between: median_days,
        std_days_between: std_days,
        expected_next_order: expected_next.date(),
        days_overdue,
        purchase_regularity,
        active_months,
        activity_rate,
    }
}
