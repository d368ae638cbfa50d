//! Heuristic survival and short-horizon forecast metrics.

use crate::record::{BasicMetrics, LifecycleMetrics, PredictiveMetrics, RfmMetrics};

pub const CHURN_RISK_HIGH: &str = "High";
pub const CHURN_RISK_MEDIUM: &str = "Medium";
pub const CHURN_RISK_LOW: &str = "Low";

/// Probability-alive proxy: linear decay in the sleep factor, hitting
/// zero at three missed purchase cycles. The one shared definition —
/// both the value and predictive stages call this.
pub fn prob_alive(sleep_factor: f64) -> f64 {
    (1.0 - (sleep_factor / 3.0).min(1.0)).max(0.0)
}

pub fn compute_predictive(
    basic: &BasicMetrics,
    rfm: &RfmMetrics,
    lifecycle: &LifecycleMetrics,
) -> PredictiveMetrics {
    let alive = prob_alive(lifecycle.sleep_factor);
    let churn_probability = 1.0 - alive;

    let churn_risk_segment = if churn_probability >= 0.7 {
        CHURN_RISK_HIGH
    } else if churn_probability >= 0.3 {
        CHURN_RISK_MEDIUM
    } else {
        CHURN_RISK_LOW
    };

    let predicted_orders_30d = rfm.frequency * alive;
    let predicted_orders_90d = rfm.frequency * 3.0 * alive;

    PredictiveMetrics {
        prob_alive: alive,
        churn_probability,
        churn_risk_segment: churn_risk_segment.to_string(),
        predicted_orders_30d,
        predicted_orders_90d,
        predicted_revenue_30d: predicted_orders_30d * basic.avg_check,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prob_alive_decays_linearly_and_clamps() {
        assert_eq!(prob_alive(0.0), 1.0);
        assert!((prob_alive(1.5) - 0.5).abs() < 1e-12);
        assert_eq!(prob_alive(3.0), 0.0);
        assert_eq!(prob_alive(10.0), 0.0);
    }
}
