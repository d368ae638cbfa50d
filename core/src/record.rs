//! The per-customer metric record and its seven typed fragments.
//!
//! Each pipeline stage returns one fragment; later stages read the
//! earlier fragments read-only. The flattened composition is what the
//! store upserts — one row per (tenant, customer), fully overwritten
//! on every recomputation.

use crate::types::CustomerId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Basic transactional metrics (11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub total_orders: i64,
    pub total_revenue: f64,
    pub total_items: f64,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
    pub avg_check: f64,
    pub avg_items_per_order: f64,
    pub max_check: f64,
    pub min_check: f64,
    pub std_check: f64,
    pub avg_margin: f64,
}

/// RFM metrics (5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfmMetrics {
    pub recency: i64,
    pub frequency: f64,
    pub monetary: f64,
    pub rfm_score: i64,
    pub rfm_segment: String,
}

/// Purchase-cadence metrics (10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalMetrics {
    pub customer_age_days: i64,
    pub customer_age_months: i64,
    pub avg_days_between: f64,
    pub median_days_between: f64,
    pub std_days_between: f64,
    pub expected_next_order: NaiveDate,
    pub days_overdue: i64,
    pub purchase_regularity: f64,
    pub active_months: i64,
    pub activity_rate: f64,
}

/// Lifecycle-stage metrics (8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleMetrics {
    pub lifecycle_stage: String,
    pub sleep_days: i64,
    pub sleep_factor: f64,
    pub is_new: bool,
    pub is_active: bool,
    pub is_sleeping: bool,
    pub is_churned: bool,
    pub cohort: String,
}

/// Customer-value metrics (11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueMetrics {
    pub clv_historical: f64,
    pub clv_predicted: f64,
    pub clv_segment: String,
    pub abc_segment: String,
    pub xyz_segment: String,
    pub abc_xyz_segment: String,
    pub profit_contribution: f64,
    pub cumulative_percentile: f64,
    pub revenue_trend: f64,
    pub check_trend: f64,
    pub frequency_trend: f64,
}

/// Predictive metrics (6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveMetrics {
    pub prob_alive: f64,
    pub churn_probability: f64,
    pub churn_risk_segment: String,
    pub predicted_orders_30d: f64,
    pub predicted_orders_90d: f64,
    pub predicted_revenue_30d: f64,
}

/// Product-affinity metrics (5). All empty/zero for customers whose
/// receipts carry no line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityMetrics {
    pub favorite_category: Option<String>,
    pub favorite_sku: Option<String>,
    pub category_diversity: i64,
    pub sku_diversity: i64,
    pub cross_sell_potential: f64,
}

/// The complete per-customer record — the engine's primary output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerMetricRecord {
    pub customer_id: CustomerId,
    #[serde(flatten)]
    pub basic: BasicMetrics,
    #[serde(flatten)]
    pub rfm: RfmMetrics,
    #[serde(flatten)]
    pub temporal: TemporalMetrics,
    #[serde(flatten)]
    pub lifecycle: LifecycleMetrics,
    #[serde(flatten)]
    pub value: ValueMetrics,
    #[serde(flatten)]
    pub predictive: PredictiveMetrics,
    #[serde(flatten)]
    pub affinity: AffinityMetrics,
    pub calculated_at: NaiveDateTime,
}
