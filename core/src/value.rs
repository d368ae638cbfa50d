//! Customer value metrics: CLV, ABC/XYZ segmentation, profit
//! contribution, and short-term trend deltas.

use crate::{
    config::EngineConfig,
    facts::TransactionFact,
    predictive::prob_alive,
    record::{BasicMetrics, LifecycleMetrics, RfmMetrics, TemporalMetrics, ValueMetrics},
    stats,
};
use chrono::Duration;

pub const CLV_VIP: &str = "VIP";
pub const CLV_HIGH: &str = "High";
pub const CLV_MEDIUM: &str = "Medium";
pub const CLV_LOW: &str = "Low";

/// Tenant-wide revenue distribution, computed once per run from the
/// full identified-customer snapshot and read-only thereafter.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub total_revenue: f64,
    pub revenue_p80: f64,
    pub revenue_p50: f64,
}

impl TenantContext {
    /// Build from per-customer revenue totals. Guest transactions are
    /// already excluded from the snapshot.
    pub fn from_customer_revenues(revenues: &[f64]) -> Self {
        Self {
            total_revenue: revenues.iter().sum(),
            revenue_p80: stats::percentile(revenues, 0.8),
            revenue_p50: stats::percentile(revenues, 0.5),
        }
    }
}

pub fn compute_value(
    transactions: &[&TransactionFact],
    basic: &BasicMetrics,
    rfm: &RfmMetrics,
    temporal: &TemporalMetrics,
    lifecycle: &LifecycleMetrics,
    context: &TenantContext,
    config: &EngineConfig,
) -> ValueMetrics {
    let revenue = basic.total_revenue;

    let clv_historical = revenue;

    // Annualized heuristic, damped by the shared survival proxy. Not a
    // probabilistic lifetime model.
    let alive = prob_alive(lifecycle.sleep_factor);
    let clv_predicted = basic.avg_check * rfm.frequency * 12.0 * alive;

    let clv_segment = if clv_predicted >= 50_000.0 {
        CLV_VIP
    } else if clv_predicted >= 20_000.0 {
        CLV_HIGH
    } else if clv_predicted >= 5_000.0 {
        CLV_MEDIUM
    } else {
        CLV_LOW
    };

    let profit_contribution = if context.total_revenue > 0.0 {
        revenue / context.total_revenue
    } else {
        0.0
    };

    let abc_segment = if revenue >= context.revenue_p80 {
        "A"
    } else if revenue >= context.revenue_p50 {
        "B"
    } else {
        "C"
    };

    let xyz_segment = if temporal.purchase_regularity >= 0.7 {
        "X"
    } else if temporal.purchase_regularity >= 0.4 {
        "Y"
    } else {
        "Z"
    };

    let trends = compute_trends(transactions, config);

    ValueMetrics {
        clv_historical,
        clv_predicted,
        clv_segment: clv_segment.to_string(),
        abc_segment: abc_segment.to_string(),
        xyz_segment: xyz_segment.to_string(),
        abc_xyz_segment: format!("{abc_segment}{xyz_segment}"),
        profit_contribution,
        cumulative_percentile: profit_contribution * 100.0,
        revenue_trend: trends.revenue,
        check_trend: trends.check,
        frequency_trend: trends.frequency,
    }
}

struct TrendDeltas {
    revenue: f64,
    check: f64,
    frequency: f64,
}

/// Relative change between the most recent 90-day window and the 90
/// days before it.
fn compute_trends(transactions: &[&TransactionFact], config: &EngineConfig) -> TrendDeltas {
    let today = config.today.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let recent_start = today - Duration::days(90);
    let prior_start = today - Duration::days(180);

    let recent: Vec<f64> = transactions
        .iter()
        .filter(|t| t.date >= recent_start)
        .map(|t| t.amount)
        .collect();
    let prior: Vec<f64> = transactions
        .iter()
        .filter(|t| t.date >= prior_start && t.date < recent_start)
        .map(|t| t.amount)
        .collect();

    let recent_revenue: f64 = recent.iter().sum();
    let prior_revenue: f64 = prior.iter().sum();
    let recent_check = stats::mean(&recent);
    let prior_check = stats::mean(&prior);
    // Orders per month, over the fixed three-month windows.
    let recent_freq = recent.len() as f64 / 3.0;
    let prior_freq = prior.len() as f64 / 3.0;

    TrendDeltas {
        revenue: trend(recent_revenue, prior_revenue),
        check: trend(recent_check, prior_check),
        frequency: trend(recent_freq, prior_freq),
    }
}

fn trend(recent: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        if recent > 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (recent - prior) / prior
    }
}
