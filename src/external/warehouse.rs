//! The warehouse query transport. `Warehouse::query` is the one capability
//! the executor needs: run a SQL string scoped to an organization and get
//! rows back.
//! Single-scalar metric queries and the multi-row schema-descriptor query
//! both go through it; the executor decides how many rows it expects.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One returned row, keyed by the upper-case column name the query
/// builders project (`ROW_COUNT`, `TIME_DIFF`, `COLUMN_DEFINITION`, …).
#[derive(Debug, Clone, Default)]
pub struct WarehouseRow(pub BTreeMap<String, JsonValue>);

impl WarehouseRow {
    pub fn get_f64(&self, column: &str) -> AppResult<f64> {
        let value = self
            .0
            .get(column)
            .ok_or_else(|| AppError::data_shape(format!("warehouse row missing column {column}")))?;
        value
            .as_f64()
            .ok_or_else(|| AppError::data_shape(format!("column {column} was not numeric")))
    }

    pub fn get_json(&self, column: &str) -> AppResult<&JsonValue> {
        self.0
            .get(column)
            .ok_or_else(|| AppError::data_shape(format!("warehouse row missing column {column}")))
    }

    /// Custom tests don't know their metric's column name ahead of time —
    /// the row must carry exactly one column, popped as `(name, value)`.
    pub fn only_value(&self) -> AppResult<(String, f64)> {
        let mut iter = self.0.iter();
        let (name, value) = iter
            .next()
            .ok_or_else(|| AppError::data_shape("custom query row had no columns"))?;
        if iter.next().is_some() {
            return Err(AppError::data_shape("custom query row had more than one column"));
        }
        let numeric = value
            .as_f64()
            .ok_or_else(|| AppError::data_shape(format!("column {name} was not numeric")))?;
        Ok((name.clone(), numeric))
    }
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn query(&self, organization_id: Uuid, sql: &str) -> AppResult<Vec<WarehouseRow>>;
}

/// Enforces the "exactly one row" shape the metric and custom SQL
/// contracts all require.
pub async fn query_single_row(
    warehouse: &dyn Warehouse,
    organization_id: Uuid,
    sql: &str,
) -> AppResult<WarehouseRow> {
    let mut rows = warehouse.query(organization_id, sql).await?;
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(AppError::data_shape("warehouse query returned no rows")),
        n => Err(AppError::data_shape(format!(
            "warehouse query returned {n} rows, expected exactly one"
        ))),
    }
}

/// Production implementation: POSTs the SQL to the warehouse proxy
/// service and parses a JSON array-of-objects response. Base URL + shared
/// `reqwest::Client`, timeout per call, errors translated to
/// `AppError::downstream`.
pub struct HttpWarehouse {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpWarehouse {
    pub fn new(base_url: String, http: reqwest::Client, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        }
    }
}

#[async_trait]
impl Warehouse for HttpWarehouse {
    async fn query(&self, organization_id: Uuid, sql: &str) -> AppResult<Vec<WarehouseRow>> {
        let url = format!("{}/query", self.base_url);
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&serde_json::json!({
                "organizationId": organization_id,
                "sql": sql,
            }))
            .send()
            .await
            .map_err(|err| AppError::downstream(format!("warehouse request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::downstream(format!(
                "warehouse returned status {}",
                response.status()
            )));
        }

        let rows: Vec<BTreeMap<String, JsonValue>> = response
            .json()
            .await
            .map_err(|err| AppError::downstream(format!("warehouse response was not valid JSON: {err}")))?;
        Ok(rows.into_iter().map(WarehouseRow).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWarehouse(Vec<WarehouseRow>);

    #[async_trait]
    impl Warehouse for FixedWarehouse {
        async fn query(&self, _organization_id: Uuid, _sql: &str) -> AppResult<Vec<WarehouseRow>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn single_row_helper_rejects_empty_result() {
        let warehouse = FixedWarehouse(vec![]);
        let result = query_single_row(&warehouse, Uuid::new_v4(), "select 1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn single_row_helper_rejects_multiple_rows() {
        let warehouse = FixedWarehouse(vec![WarehouseRow::default(), WarehouseRow::default()]);
        let result = query_single_row(&warehouse, Uuid::new_v4(), "select 1").await;
        assert!(result.is_err());
    }
}
