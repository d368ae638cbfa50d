//! Engine configuration.
//!
//! One immutable struct passed into the engine at construction — no
//! process-wide settings object. `today` is injectable so test runs
//! are fully deterministic.

use crate::error::MetricsResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Margin fraction used for avg_margin and profit estimates.
    #[serde(default = "default_margin_percent")]
    pub margin_percent: f64,

    /// RFM recency window. Carried for configuration parity; the
    /// threshold-based scorer does not consult it.
    #[serde(default = "default_rfm_recency_days")]
    pub rfm_recency_days: i64,

    /// A customer is "new" while their first order is within this many days.
    #[serde(default = "default_new_customer_days")]
    pub new_customer_days: i64,

    /// Sleep-factor threshold for the Sleeping stage.
    #[serde(default = "default_sleeping_threshold")]
    pub sleeping_threshold: f64,

    /// Sleep-factor threshold for the Churned stage.
    #[serde(default = "default_churned_threshold")]
    pub churned_threshold: f64,

    /// Reference "today" for all recency arithmetic.
    #[serde(default = "default_today")]
    pub today: NaiveDate,

    /// Customer-metric upserts are committed every this many customers.
    #[serde(default = "default_commit_batch_size")]
    pub commit_batch_size: usize,

    /// Minimum co-occurrence count for a cross-sell category pair.
    #[serde(default = "default_cross_sell_min_support")]
    pub cross_sell_min_support: i64,

    /// Assumed gross margin percentage for discount margin-impact analysis.
    #[serde(default = "default_assumed_margin_pct")]
    pub assumed_margin_pct: f64,
}

fn default_margin_percent() -> f64 { 0.20 }
fn default_rfm_recency_days() -> i64 { 365 }
fn default_new_customer_days() -> i64 { 30 }
fn default_sleeping_threshold() -> f64 { 1.5 }
fn default_churned_threshold() -> f64 { 3.0 }
fn default_today() -> NaiveDate { chrono::Local::now().date_naive() }
fn default_commit_batch_size() -> usize { 100 }
fn default_cross_sell_min_support() -> i64 { 10 }
fn default_assumed_margin_pct() -> f64 { 30.0 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            margin_percent: default_margin_percent(),
            rfm_recency_days: default_rfm_recency_days(),
            new_customer_days: default_new_customer_days(),
            sleeping_threshold: default_sleeping_threshold(),
            churned_threshold: default_churned_threshold(),
            today: default_today(),
            commit_batch_size: default_commit_batch_size(),
            cross_sell_min_support: default_cross_sell_min_support(),
            assumed_margin_pct: default_assumed_margin_pct(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file. Missing fields fall back
    /// to their defaults.
    pub fn load(path: &Path) -> MetricsResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Default configuration with a fixed reference date.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today, ..Self::default() }
    }
}
