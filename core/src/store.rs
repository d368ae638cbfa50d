//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. Engine modules call
//! typed store methods — they never execute SQL directly.

use crate::{
    error::MetricsResult,
    facts::{TransactionFact, TransactionLineFact},
    record::CustomerMetricRecord,
    types::{CustomerId, TenantId},
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

mod aggregate;

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

pub struct MetricsStore {
    conn: Connection,
}

impl MetricsStore {
    pub fn open(path: &str) -> MetricsResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL only matters for real files; shared-memory URIs ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_facts.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_customer_metrics.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_aggregate_metrics.sql"))?;
        Ok(())
    }

    // ── Commit batching ─────────────────────────────────────────────

    /// Open an explicit write window. Paired with `commit_batch`; the
    /// engine commits every N customer upserts so a mid-run crash
    /// loses at most one window.
    pub fn begin_batch(&self) -> MetricsResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(())
    }

    pub fn commit_batch(&self) -> MetricsResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Best-effort rollback of an open batch; the original error is
    /// what the caller reports, not a rollback failure.
    pub fn rollback_batch(&self) {
        if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
            log::warn!("rollback failed: {err}");
        }
    }

    // ── Fact writes (importer / generator / tests) ──────────────────

    pub fn insert_product(
        &self,
        tenant_id: &str,
        product_id: &str,
        name: &str,
        category: Option<&str>,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO products (id, tenant_id, name, category)
             VALUES (?1, ?2, ?3, ?4)",
            params![product_id, tenant_id, name, category],
        )?;
        Ok(())
    }

    pub fn insert_transaction(
        &self,
        tenant_id: &str,
        transaction_id: &str,
        customer_id: Option<&str>,
        date: NaiveDateTime,
        amount: f64,
        amount_before_discount: Option<f64>,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO transactions
                 (id, tenant_id, customer_id, transaction_date, amount, amount_before_discount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                transaction_id,
                tenant_id,
                customer_id,
                date.format(TIMESTAMP_FMT).to_string(),
                amount,
                amount_before_discount,
            ],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_transaction_item(
        &self,
        tenant_id: &str,
        transaction_id: &str,
        product_id: &str,
        quantity: f64,
        price: f64,
        price_before_discount: f64,
        discount_id: Option<&str>,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO transaction_items
                 (tenant_id, transaction_id, product_id, quantity, price,
                  price_before_discount, discount_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tenant_id,
                transaction_id,
                product_id,
                quantity,
                price,
                price_before_discount,
                discount_id,
            ],
        )?;
        Ok(())
    }

    // ── Fact reads ──────────────────────────────────────────────────

    /// Load the tenant's full transaction snapshot with per-receipt
    /// item counts, ordered by (customer, date). NULL numerics coerce
    /// to 0; a NULL gross amount coerces to the net amount.
    pub fn load_transactions(&self, tenant_id: &TenantId) -> MetricsResult<Vec<TransactionFact>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                 t.id,
                 t.customer_id,
                 t.transaction_date,
                 COALESCE(t.amount, 0),
                 COALESCE(t.amount_before_discount, t.amount, 0),
                 COALESCE((SELECT SUM(ti.quantity) FROM transaction_items ti
                           WHERE ti.transaction_id = t.id AND ti.tenant_id = t.tenant_id), 0)
             FROM transactions t
             WHERE t.tenant_id = ?1
             ORDER BY t.customer_id, t.transaction_date, t.id",
        )?;
        let rows = stmt.query_map(params![tenant_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?;

        let mut facts = Vec::new();
        for row in rows {
            let (id, customer_id, date_raw, amount, amount_before_discount, items_count) = row?;
            facts.push(TransactionFact {
                id,
                customer_id,
                date: NaiveDateTime::parse_from_str(&date_raw, TIMESTAMP_FMT)?,
                amount,
                amount_before_discount,
                items_count,
            });
        }
        Ok(facts)
    }

    /// Load all receipt lines joined to products and headers.
    pub fn load_transaction_lines(
        &self,
        tenant_id: &TenantId,
    ) -> MetricsResult<Vec<TransactionLineFact>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                 ti.transaction_id,
                 t.customer_id,
                 t.transaction_date,
                 ti.product_id,
                 p.name,
                 p.category,
                 COALESCE(ti.quantity, 0),
                 COALESCE(ti.price, 0),
                 COALESCE(ti.price_before_discount, ti.price, 0),
                 ti.discount_id
             FROM transaction_items ti
             JOIN transactions t ON ti.transaction_id = t.id AND ti.tenant_id = t.tenant_id
             JOIN products p ON ti.product_id = p.id AND ti.tenant_id = p.tenant_id
             WHERE ti.tenant_id = ?1
             ORDER BY t.transaction_date, ti.transaction_id, ti.id",
        )?;
        let rows = stmt.query_map(params![tenant_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;

        let mut lines = Vec::new();
        for row in rows {
            let (
                transaction_id,
                customer_id,
                date_raw,
                product_id,
                product_name,
                category,
                quantity,
                price,
                price_before_discount,
                discount_id,
            ) = row?;
            lines.push(TransactionLineFact {
                transaction_id,
                customer_id,
                date: NaiveDateTime::parse_from_str(&date_raw, TIMESTAMP_FMT)?,
                product_id,
                product_name,
                category,
                quantity,
                price,
                price_before_discount,
                discount_id,
            });
        }
        Ok(lines)
    }

    // ── Customer metrics ────────────────────────────────────────────

    /// Upsert one customer's record. Every column is overwritten; the
    /// row is keyed by (tenant, customer) and never merged field-wise.
    pub fn upsert_customer_metrics(
        &self,
        tenant_id: &TenantId,
        record: &CustomerMetricRecord,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO customer_metrics (
                 tenant_id, customer_id,
                 total_orders, total_revenue, total_items,
                 first_order_date, last_order_date,
                 avg_check, avg_items_per_order, max_check, min_check, std_check, avg_margin,
                 recency, frequency, monetary, rfm_score, rfm_segment,
                 customer_age_days, customer_age_months,
                 avg_days_between, median_days_between, std_days_between,
                 expected_next_order, days_overdue, purchase_regularity,
                 active_months, activity_rate,
                 lifecycle_stage, sleep_days, sleep_factor,
                 is_new, is_active, is_sleeping, is_churned, cohort,
                 clv_historical, clv_predicted, clv_segment,
                 abc_segment, xyz_segment, abc_xyz_segment,
                 profit_contribution, cumulative_percentile,
                 revenue_trend, check_trend, frequency_trend,
                 prob_alive, churn_probability, churn_risk_segment,
                 predicted_orders_30d, predicted_orders_90d, predicted_revenue_30d,
                 favorite_category, favorite_sku,
                 category_diversity, sku_diversity, cross_sell_potential,
                 calculated_at
             ) VALUES (
                 ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                 ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                 ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38, ?39, ?40,
                 ?41, ?42, ?43, ?44, ?45, ?46, ?47, ?48, ?49, ?50,
                 ?51, ?52, ?53, ?54, ?55, ?56, ?57, ?58, ?59
             )
             ON CONFLICT (tenant_id, customer_id) DO UPDATE SET
                 total_orders = excluded.total_orders,
                 total_revenue = excluded.total_revenue,
                 total_items = excluded.total_items,
                 first_order_date = excluded.first_order_date,
                 last_order_date = excluded.last_order_date,
                 avg_check = excluded.avg_check,
                 avg_items_per_order = excluded.avg_items_per_order,
                 max_check = excluded.max_check,
                 min_check = excluded.min_check,
                 std_check = excluded.std_check,
                 avg_margin = excluded.avg_margin,
                 recency = excluded.recency,
                 frequency = excluded.frequency,
                 monetary = excluded.monetary,
                 rfm_score = excluded.rfm_score,
                 rfm_segment = excluded.rfm_segment,
                 customer_age_days = excluded.customer_age_days,
                 customer_age_months = excluded.customer_age_months,
                 avg_days_between = excluded.avg_days_between,
                 median_days_between = excluded.median_days_between,
                 std_days_between = excluded.std_days_between,
                 expected_next_order = excluded.expected_next_order,
                 days_overdue = excluded.days_overdue,
                 purchase_regularity = excluded.purchase_regularity,
                 active_months = excluded.active_months,
                 activity_rate = excluded.activity_rate,
                 lifecycle_stage = excluded.lifecycle_stage,
                 sleep_days = excluded.sleep_days,
                 sleep_factor = excluded.sleep_factor,
                 is_new = excluded.is_new,
                 is_active = excluded.is_active,
                 is_sleeping = excluded.is_sleeping,
                 is_churned = excluded.is_churned,
                 cohort = excluded.cohort,
                 clv_historical = excluded.clv_historical,
                 clv_predicted = excluded.clv_predicted,
                 clv_segment = excluded.clv_segment,
                 abc_segment = excluded.abc_segment,
                 xyz_segment = excluded.xyz_segment,
                 abc_xyz_segment = excluded.abc_xyz_segment,
                 profit_contribution = excluded.profit_contribution,
                 cumulative_percentile = excluded.cumulative_percentile,
                 revenue_trend = excluded.revenue_trend,
                 check_trend = excluded.check_trend,
                 frequency_trend = excluded.frequency_trend,
                 prob_alive = excluded.prob_alive,
                 churn_probability = excluded.churn_probability,
                 churn_risk_segment = excluded.churn_risk_segment,
                 predicted_orders_30d = excluded.predicted_orders_30d,
                 predicted_orders_90d = excluded.predicted_orders_90d,
                 predicted_revenue_30d = excluded.predicted_revenue_30d,
                 favorite_category = excluded.favorite_category,
                 favorite_sku = excluded.favorite_sku,
                 category_diversity = excluded.category_diversity,
                 sku_diversity = excluded.sku_diversity,
                 cross_sell_potential = excluded.cross_sell_potential,
                 calculated_at = excluded.calculated_at",
            params![
                tenant_id,
                record.customer_id,
                record.basic.total_orders,
                record.basic.total_revenue,
                record.basic.total_items,
                format_date(record.basic.first_order_date),
                format_date(record.basic.last_order_date),
                record.basic.avg_check,
                record.basic.avg_items_per_order,
                record.basic.max_check,
                record.basic.min_check,
                record.basic.std_check,
                record.basic.avg_margin,
                record.rfm.recency,
                record.rfm.frequency,
                record.rfm.monetary,
                record.rfm.rfm_score,
                record.rfm.rfm_segment,
                record.temporal.customer_age_days,
                record.temporal.customer_age_months,
                record.temporal.avg_days_between,
                record.temporal.median_days_between,
                record.temporal.std_days_between,
                format_date(record.temporal.expected_next_order),
                record.temporal.days_overdue,
                record.temporal.purchase_regularity,
                record.temporal.active_months,
                record.temporal.activity_rate,
                record.lifecycle.lifecycle_stage,
                record.lifecycle.sleep_days,
                record.lifecycle.sleep_factor,
                record.lifecycle.is_new,
                record.lifecycle.is_active,
                record.lifecycle.is_sleeping,
                record.lifecycle.is_churned,
                record.lifecycle.cohort,
                record.value.clv_historical,
                record.value.clv_predicted,
                record.value.clv_segment,
                record.value.abc_segment,
                record.value.xyz_segment,
                record.value.abc_xyz_segment,
                record.value.profit_contribution,
                record.value.cumulative_percentile,
                record.value.revenue_trend,
                record.value.check_trend,
                record.value.frequency_trend,
                record.predictive.prob_alive,
                record.predictive.churn_probability,
                record.predictive.churn_risk_segment,
                record.predictive.predicted_orders_30d,
                record.predictive.predicted_orders_90d,
                record.predictive.predicted_revenue_30d,
                record.affinity.favorite_category,
                record.affinity.favorite_sku,
                record.affinity.category_diversity,
                record.affinity.sku_diversity,
                record.affinity.cross_sell_potential,
                record.calculated_at.format(TIMESTAMP_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn customer_metrics_count(&self, tenant_id: &TenantId) -> MetricsResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM customer_metrics WHERE tenant_id = ?1",
            params![tenant_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Previously computed RFM segment per customer, for aggregate
    /// segment breakdowns. Customers without metrics are absent.
    pub fn load_rfm_segments(
        &self,
        tenant_id: &TenantId,
    ) -> MetricsResult<BTreeMap<CustomerId, String>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, rfm_segment FROM customer_metrics
             WHERE tenant_id = ?1 AND rfm_segment IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![tenant_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut segments = BTreeMap::new();
        for row in rows {
            let (customer_id, segment) = row?;
            segments.insert(customer_id, segment);
        }
        Ok(segments)
    }

    /// One scalar TEXT column from a customer's metric row. Test and
    /// inspection helper.
    pub fn customer_metric_text(
        &self,
        tenant_id: &TenantId,
        customer_id: &CustomerId,
        column: &str,
    ) -> MetricsResult<Option<String>> {
        // Column names come from our own code, not user input.
        let sql = format!(
            "SELECT CAST({column} AS TEXT) FROM customer_metrics
             WHERE tenant_id = ?1 AND customer_id = ?2"
        );
        let value = self
            .conn
            .query_row(&sql, params![tenant_id, customer_id], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(value.flatten())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}
