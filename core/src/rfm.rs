//! Basic transactional metrics and RFM scoring.
//!
//! Scores use fixed absolute thresholds rather than quantiles of the
//! tenant's actual distribution. That is a deliberate carry-over from
//! the source system (currency-specific constants); known limitation.

use crate::{
    config::EngineConfig,
    facts::TransactionFact,
    record::{BasicMetrics, RfmMetrics},
    stats,
};

/// Days-since-last-order thresholds, scored inversely.
const RECENCY_THRESHOLDS: [f64; 4] = [7.0, 30.0, 90.0, 180.0];
/// Orders-per-month thresholds.
const FREQUENCY_THRESHOLDS: [f64; 4] = [0.1, 0.25, 0.5, 1.0];
/// Total-spend thresholds, in store currency units.
const MONETARY_THRESHOLDS: [f64; 4] = [1000.0, 5000.0, 15000.0, 50000.0];

/// Exact-triple segment table. Triples not listed fall back to
/// `fallback_segment`.
const RFM_SEGMENTS: [((i64, i64, i64), &str); 29] = [
    ((5, 5, 5), "Champions"),
    ((5, 5, 4), "Champions"),
    ((5, 4, 5), "Champions"),
    ((4, 5, 5), "Loyal"),
    ((5, 4, 4), "Loyal"),
    ((4, 5, 4), "Loyal"),
    ((4, 4, 5), "Loyal"),
    ((4, 4, 4), "Loyal"),
    ((5, 3, 3), "Potential loyal"),
    ((4, 3, 3), "Potential loyal"),
    ((3, 3, 3), "Needs attention"),
    ((3, 3, 4), "Needs attention"),
    ((3, 4, 3), "Needs attention"),
    ((2, 3, 3), "Sleeping"),
    ((2, 2, 3), "Sleeping"),
    ((2, 3, 2), "Sleeping"),
    ((3, 2, 2), "Sleeping"),
    ((2, 2, 2), "At risk"),
    ((1, 2, 2), "At risk"),
    ((2, 1, 2), "At risk"),
    ((2, 2, 1), "At risk"),
    ((1, 1, 2), "Leaving"),
    ((1, 2, 1), "Leaving"),
    ((2, 1, 1), "Leaving"),
    ((1, 1, 1), "Lost"),
    ((5, 1, 1), "New"),
    ((5, 1, 2), "New"),
    ((4, 1, 1), "New"),
    ((4, 1, 2), "New"),
];

/// Basic transactional metrics over a customer's (date-ordered) receipts.
pub fn compute_basic(transactions: &[&TransactionFact], config: &EngineConfig) -> BasicMetrics {
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let items: Vec<f64> = transactions.iter().map(|t| t.items_count).collect();
    let orders = transactions.len() as i64;
    let total_revenue: f64 = amounts.iter().sum();

    BasicMetrics {
        total_orders: orders,
        total_revenue,
        total_items: items.iter().sum(),
        first_order_date: transactions[0].date.date(),
        last_order_date: transactions[transactions.len() - 1].date.date(),
        avg_check: stats::mean(&amounts),
        avg_items_per_order: stats::mean(&items),
        max_check: amounts.iter().cloned().fold(f64::MIN, f64::max),
        min_check: amounts.iter().cloned().fold(f64::MAX, f64::min),
        std_check: if amounts.len() > 1 { stats::population_std(&amounts) } else { 0.0 },
        avg_margin: total_revenue * config.margin_percent / orders as f64,
    }
}

/// RFM metrics for one customer.
pub fn compute_rfm(
    transactions: &[&TransactionFact],
    basic: &BasicMetrics,
    config: &EngineConfig,
) -> RfmMetrics {
    let last_order = transactions[transactions.len() - 1].date;
    let first_order = transactions[0].date;
    let today = config.today.and_hms_opt(0, 0, 0).expect("midnight is valid");

    let recency = (today - last_order).num_days();

    // Orders per active month, with a one-month floor so single-day
    // histories don't blow up the ratio.
    let span_months = ((last_order - first_order).num_days() as f64 / 30.0).max(1.0);
    let frequency = transactions.len() as f64 / span_months;

    let monetary = basic.total_revenue;

    let r_score = threshold_score(recency as f64, &RECENCY_THRESHOLDS, true);
    let f_score = threshold_score(frequency, &FREQUENCY_THRESHOLDS, false);
    let m_score = threshold_score(monetary, &MONETARY_THRESHOLDS, false);

    RfmMetrics {
        recency,
        frequency,
        monetary,
        rfm_score: r_score * 100 + f_score * 10 + m_score,
        rfm_segment: segment_for(r_score, f_score, m_score).to_string(),
    }
}

/// Map a value onto a 1–5 score: one point per threshold strictly
/// exceeded, inverted for recency (fewer days → higher score).
pub fn threshold_score(value: f64, thresholds: &[f64; 4], inverse: bool) -> i64 {
    let exceeded = thresholds.iter().filter(|t| value > **t).count() as i64;
    let score = if inverse { 5 - exceeded } else { 1 + exceeded };
    score.clamp(1, 5)
}

/// Segment name for an (R, F, M) score triple. Total over [1,5]³:
/// table hit or coarse fallback.
pub fn segment_for(r: i64, f: i64, m: i64) -> &'static str {
    for ((tr, tf, tm), segment) in RFM_SEGMENTS {
        if (tr, tf, tm) == (r, f, m) {
            return segment;
        }
    }
    fallback_segment(r, f)
}

fn fallback_segment(r: i64, f: i64) -> &'static str {
    if r >= 4 {
        if f >= 3 {
            "Loyal"
        } else {
            "New"
        }
    } else if r >= 2 {
        "Sleeping"
    } else {
        "Lost"
    }
}
