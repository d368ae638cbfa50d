//! Lifecycle staging from recency vs. purchase cadence.

use crate::{
    config::EngineConfig,
    record::{BasicMetrics, LifecycleMetrics, RfmMetrics, TemporalMetrics},
};

pub const STAGE_NEW: &str = "New";
pub const STAGE_ACTIVE: &str = "Active";
pub const STAGE_SLEEPING: &str = "Sleeping";
pub const STAGE_CHURNED: &str = "Churned";
pub const STAGE_UNDETERMINED: &str = "Undetermined";

pub fn compute_lifecycle(
    basic: &BasicMetrics,
    rfm: &RfmMetrics,
    temporal: &TemporalMetrics,
    config: &EngineConfig,
) -> LifecycleMetrics {
    let recency = rfm.recency as f64;
    let avg_days = temporal.avg_days_between;

    // How many expected purchase cycles the customer has slept through.
    let sleep_factor = if avg_days > 0.0 {
        recency / avg_days
    } else {
        recency / 30.0
    };

    let is_new = temporal.customer_age_days <= config.new_customer_days;
    let is_churned = sleep_factor >= config.churned_threshold;
    let is_sleeping = sleep_factor >= config.sleeping_threshold && !is_churned;
    let is_active = !is_new && !is_sleeping && !is_churned;

    // Priority order is load-bearing for determinism: New wins over
    // everything, Undetermined only if no flag is set.
    let stage = if is_new {
        STAGE_NEW
    } else if is_active {
        STAGE_ACTIVE
    } else if is_sleeping {
        STAGE_SLEEPING
    } else if is_churned {
        STAGE_CHURNED
    } else {
        STAGE_UNDETERMINED
    };

    let sleep_days = if recency > avg_days {
        (recency - avg_days) as i64
    } else {
        0
    };

    LifecycleMetrics {
        lifecycle_stage: stage.to_string(),
        sleep_days,
        sleep_factor,
        is_new,
        is_active,
        is_sleeping,
        is_churned,
        cohort: basic.first_order_date.format("%Y-%m").to_string(),
    }
}
