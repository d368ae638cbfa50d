//! Run orchestration.
//!
//! The engine owns the store, loads the tenant's fact snapshot once,
//! runs the per-customer pipeline stage by stage and persists results
//! in commit batches. One customer failing is recorded and skipped;
//! it never aborts the run. Aggregate analytics follow the same
//! pattern per named metric.

use crate::{
    affinity, discount_analytics,
    config::EngineConfig,
    error::{MetricsError, MetricsResult},
    facts::{self, TransactionLineFact},
    lifecycle, predictive, product_analytics,
    record::CustomerMetricRecord,
    rfm,
    store::MetricsStore,
    temporal, time_analytics,
    types::{CustomerId, TenantId},
    value::{self, TenantContext},
};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    NoData,
}

/// One customer the pipeline could not process.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerFailure {
    pub customer_id: CustomerId,
    pub error: String,
}

/// Outcome of a per-customer metrics run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub customers: usize,
    pub errors: usize,
    pub failures: Vec<CustomerFailure>,
    pub duration_seconds: f64,
}

/// One aggregate metric that failed to compute or persist.
#[derive(Debug, Clone, Serialize)]
pub struct MetricFailure {
    pub metric_name: String,
    pub error: String,
}

/// Outcome of an aggregate analytics run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRunSummary {
    pub status: RunStatus,
    pub metrics_computed: usize,
    pub errors: usize,
    pub failures: Vec<MetricFailure>,
    pub duration_seconds: f64,
}

pub struct MetricsEngine {
    store: MetricsStore,
    tenant_id: TenantId,
    config: EngineConfig,
}

impl MetricsEngine {
    pub fn new(store: MetricsStore, tenant_id: TenantId, config: EngineConfig) -> Self {
        Self { store, tenant_id, config }
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    // ── Per-customer metrics ────────────────────────────────────────

    /// Compute all customer records without touching the database
    /// beyond the initial snapshot load. Pure given a fixed snapshot
    /// and config: same inputs, same records.
    pub fn compute_customer_records(
        &self,
        calculated_at: NaiveDateTime,
    ) -> MetricsResult<(Vec<CustomerMetricRecord>, Vec<CustomerFailure>)> {
        let transactions = self.store.load_transactions(&self.tenant_id)?;
        let lines = self.store.load_transaction_lines(&self.tenant_id)?;

        let grouped = facts::group_by_customer(&transactions);
        let lines_by_customer = group_lines_by_customer(&lines);

        let revenues: Vec<f64> = grouped
            .values()
            .map(|txns| txns.iter().map(|t| t.amount).sum())
            .collect();
        let context = TenantContext::from_customer_revenues(&revenues);

        let mut records = Vec::with_capacity(grouped.len());
        let mut failures = Vec::new();
        for (customer_id, txns) in &grouped {
            let customer_lines = lines_by_customer
                .get(customer_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            match self.compute_one(customer_id, txns, customer_lines, &context, calculated_at) {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::warn!("customer {customer_id}: {err}");
                    failures.push(CustomerFailure {
                        customer_id: customer_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok((records, failures))
    }

    fn compute_one(
        &self,
        customer_id: &CustomerId,
        transactions: &[&facts::TransactionFact],
        lines: &[&TransactionLineFact],
        context: &TenantContext,
        calculated_at: NaiveDateTime,
    ) -> MetricsResult<CustomerMetricRecord> {
        if transactions.is_empty() {
            return Err(MetricsError::EmptyCustomerHistory {
                customer_id: customer_id.clone(),
            });
        }

        let basic = rfm::compute_basic(transactions, &self.config);
        let rfm = rfm::compute_rfm(transactions, &basic, &self.config);
        let temporal = temporal::compute_temporal(transactions, &self.config);
        let lifecycle = lifecycle::compute_lifecycle(&basic, &rfm, &temporal, &self.config);
        let value =
            value::compute_value(transactions, &basic, &rfm, &temporal, &lifecycle, context, &self.config);
        let predictive = predictive::compute_predictive(&basic, &rfm, &lifecycle);
        let affinity = affinity::compute_affinity(lines);

        Ok(CustomerMetricRecord {
            customer_id: customer_id.clone(),
            basic,
            rfm,
            temporal,
            lifecycle,
            value,
            predictive,
            affinity,
            calculated_at,
        })
    }

    /// Full per-customer run: compute every record and upsert them in
    /// commit batches.
    pub fn recompute_customer_metrics(&self) -> MetricsResult<RunSummary> {
        let started = Instant::now();
        let calculated_at = Utc::now().naive_utc();

        let (records, failures) = self.compute_customer_records(calculated_at)?;
        if records.is_empty() && failures.is_empty() {
            log::info!("tenant {}: no identified customers, nothing to do", self.tenant_id);
            return Ok(RunSummary {
                status: RunStatus::NoData,
                customers: 0,
                errors: 0,
                failures: Vec::new(),
                duration_seconds: elapsed_seconds(started),
            });
        }

        for batch in records.chunks(self.config.commit_batch_size.max(1)) {
            self.store.begin_batch()?;
            for record in batch {
                if let Err(err) = self.store.upsert_customer_metrics(&self.tenant_id, record) {
                    self.store.rollback_batch();
                    return Err(err);
                }
            }
            self.store.commit_batch()?;
        }

        log::info!(
            "tenant {}: stored metrics for {} customers ({} failed)",
            self.tenant_id,
            records.len(),
            failures.len()
        );
        Ok(RunSummary {
            status: RunStatus::Success,
            customers: records.len(),
            errors: failures.len(),
            failures,
            duration_seconds: elapsed_seconds(started),
        })
    }

    // ── Aggregate analytics ─────────────────────────────────────────

    pub fn recompute_product_analytics(&self) -> MetricsResult<AggregateRunSummary> {
        let started = Instant::now();
        let transactions = self.store.load_transactions(&self.tenant_id)?;
        let lines = self.store.load_transaction_lines(&self.tenant_id)?;
        if transactions.is_empty() {
            return Ok(no_data_summary(started));
        }

        let metrics: Vec<(&str, MetricsResult<serde_json::Value>)> = vec![
            ("category_stats", to_json(&product_analytics::category_stats(&lines))),
            ("top_products", to_json(&product_analytics::top_products(&lines))),
            (
                "category_trends",
                to_json(&product_analytics::category_trends(&lines, &self.config)),
            ),
            ("basket_analysis", to_json(&product_analytics::basket_analysis(&lines))),
            ("product_abc", to_json(&product_analytics::product_abc(&lines))),
            (
                "cross_sell",
                to_json(&product_analytics::cross_sell_matrix(
                    &lines,
                    self.config.cross_sell_min_support,
                )),
            ),
            (
                "category_penetration",
                to_json(&product_analytics::category_penetration(&transactions, &lines)),
            ),
        ];
        self.persist_aggregates(metrics, started)
    }

    pub fn recompute_discount_analytics(&self) -> MetricsResult<AggregateRunSummary> {
        let started = Instant::now();
        let transactions = self.store.load_transactions(&self.tenant_id)?;
        let lines = self.store.load_transaction_lines(&self.tenant_id)?;
        if transactions.is_empty() {
            return Ok(no_data_summary(started));
        }
        let segments = self.store.load_rfm_segments(&self.tenant_id)?;

        let metrics: Vec<(&str, MetricsResult<serde_json::Value>)> = vec![
            (
                "discount_overall_stats",
                to_json(&discount_analytics::overall_stats(&transactions)),
            ),
            ("discount_by_category", to_json(&discount_analytics::by_category(&lines))),
            (
                "discount_by_customer_segment",
                to_json(&discount_analytics::by_customer_segment(&transactions, &segments)),
            ),
            (
                "discount_brackets",
                to_json(&discount_analytics::discount_brackets(&transactions)),
            ),
            (
                "discount_trends",
                to_json(&discount_analytics::discount_trends(&transactions, &self.config)),
            ),
            (
                "discount_effectiveness",
                to_json(&discount_analytics::discount_effectiveness(&transactions)),
            ),
            (
                "customer_discount_behavior",
                to_json(&discount_analytics::customer_discount_behavior(&transactions)),
            ),
            (
                "product_discount_analysis",
                to_json(&discount_analytics::product_discount_analysis(&lines)),
            ),
            (
                "margin_impact",
                to_json(&discount_analytics::margin_impact(&transactions, &self.config)),
            ),
            (
                "discount_cannibalization",
                to_json(&discount_analytics::cannibalization(&transactions)),
            ),
        ];
        self.persist_aggregates(metrics, started)
    }

    pub fn recompute_time_analytics(&self) -> MetricsResult<AggregateRunSummary> {
        let started = Instant::now();
        let transactions = self.store.load_transactions(&self.tenant_id)?;
        if transactions.is_empty() {
            return Ok(no_data_summary(started));
        }

        let metrics: Vec<(&str, MetricsResult<serde_json::Value>)> = vec![
            ("day_of_week", to_json(&time_analytics::day_of_week(&transactions))),
            ("hour_of_day", to_json(&time_analytics::hour_of_day(&transactions))),
            (
                "monthly_trends",
                to_json(&time_analytics::monthly_trends(&transactions, &self.config)),
            ),
            (
                "weekly_trends",
                to_json(&time_analytics::weekly_trends(&transactions, &self.config)),
            ),
            ("seasonality", to_json(&time_analytics::seasonality(&transactions))),
            (
                "cohort_retention",
                to_json(&time_analytics::cohort_retention(&transactions, &self.config)),
            ),
            (
                "cohort_revenue",
                to_json(&time_analytics::cohort_revenue(&transactions, &self.config)),
            ),
            ("yoy_comparison", to_json(&time_analytics::yoy_comparison(&transactions))),
            (
                "peak_periods",
                to_json(&time_analytics::peak_periods(&transactions, &self.config)),
            ),
        ];
        self.persist_aggregates(metrics, started)
    }

    fn persist_aggregates(
        &self,
        metrics: Vec<(&str, MetricsResult<serde_json::Value>)>,
        started: Instant,
    ) -> MetricsResult<AggregateRunSummary> {
        let calculated_at = Utc::now().naive_utc();
        let mut computed = 0usize;
        let mut failures = Vec::new();

        for (name, result) in metrics {
            let outcome = result.and_then(|data| {
                self.store.upsert_aggregate(&self.tenant_id, name, &data, calculated_at)
            });
            match outcome {
                Ok(()) => computed += 1,
                Err(err) => {
                    log::warn!("aggregate metric {name}: {err}");
                    failures.push(MetricFailure {
                        metric_name: name.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "tenant {}: stored {computed} aggregate metrics ({} failed)",
            self.tenant_id,
            failures.len()
        );
        Ok(AggregateRunSummary {
            status: RunStatus::Success,
            metrics_computed: computed,
            errors: failures.len(),
            failures,
            duration_seconds: elapsed_seconds(started),
        })
    }
}

/// Receipt lines per identified customer, in snapshot order.
fn group_lines_by_customer(
    lines: &[TransactionLineFact],
) -> BTreeMap<&str, Vec<&TransactionLineFact>> {
    let mut grouped: BTreeMap<&str, Vec<&TransactionLineFact>> = BTreeMap::new();
    for line in lines {
        if let Some(customer_id) = line.customer_id.as_deref() {
            grouped.entry(customer_id).or_default().push(line);
        }
    }
    grouped
}

fn to_json<T: Serialize>(value: &T) -> MetricsResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn no_data_summary(started: Instant) -> AggregateRunSummary {
    AggregateRunSummary {
        status: RunStatus::NoData,
        metrics_computed: 0,
        errors: 0,
        failures: Vec::new(),
        duration_seconds: elapsed_seconds(started),
    }
}

fn elapsed_seconds(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}
