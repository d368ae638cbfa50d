//! Aggregate metric blob persistence: one named JSON document per
//! (tenant, metric name), overwritten wholesale on recomputation.

use super::{MetricsStore, TIMESTAMP_FMT};
use crate::{error::MetricsResult, types::TenantId};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

impl MetricsStore {
    pub fn upsert_aggregate(
        &self,
        tenant_id: &TenantId,
        metric_name: &str,
        data: &serde_json::Value,
        calculated_at: NaiveDateTime,
    ) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO aggregate_metrics (tenant_id, metric_name, metric_data, calculated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (tenant_id, metric_name) DO UPDATE SET
                 metric_data = excluded.metric_data,
                 calculated_at = excluded.calculated_at",
            params![
                tenant_id,
                metric_name,
                serde_json::to_string(data)?,
                calculated_at.format(TIMESTAMP_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn get_aggregate(
        &self,
        tenant_id: &TenantId,
        metric_name: &str,
    ) -> MetricsResult<Option<serde_json::Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT metric_data FROM aggregate_metrics
                 WHERE tenant_id = ?1 AND metric_name = ?2",
                params![tenant_id, metric_name],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn aggregate_count(&self, tenant_id: &TenantId) -> MetricsResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM aggregate_metrics WHERE tenant_id = ?1",
            params![tenant_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
