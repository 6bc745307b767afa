//! Postgres realization of `Storage`: each logical collection becomes a
//! tenant-suffixed table holding a `doc JSONB` payload plus the columns the
//! adapter's own joins and filters need, using typed `sqlx::query`/
//! `query_as` calls over `INSERT … ON CONFLICT` rather than an ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use super::{collection_table, Storage};
use crate::domain::{
    Alert, ExecutionRecord, HistoryPoint, QualHistoryEntry, QualResultRecord, QuantHistoryEntry,
    QuantResultRecord, SchemaMap, TestDefinition, TestKind,
};
use crate::error::{map_db_error, AppError, AppResult};

pub struct PostgresStorage {
    pool: PgPool,
}

fn quoted_table(base: &str, tenant: &str) -> String {
    format!("\"{}\"", collection_table(base, tenant))
}

fn suite_base(kind: TestKind) -> &'static str {
    if kind.is_qualitative() {
        "test_suites_qual"
    } else if kind.is_custom() {
        "test_suites_custom"
    } else {
        "test_suites"
    }
}

fn executions_base(kind: TestKind) -> &'static str {
    if kind.is_qualitative() {
        "test_executions_qual"
    } else {
        "test_executions"
    }
}

fn alerts_base(kind: TestKind) -> &'static str {
    if kind.is_qualitative() {
        "test_alerts_qual"
    } else {
        "test_alerts"
    }
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn require_one_row_affected(rows_affected: u64, what: &str) -> AppResult<()> {
        if rows_affected != 1 {
            return Err(AppError::downstream(format!(
                "{what} was not acknowledged (rows_affected={rows_affected})"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn get_test_definition(
        &self,
        tenant: &str,
        suite_id: Uuid,
        kind: TestKind,
    ) -> AppResult<TestDefinition> {
        let table = quoted_table(suite_base(kind), tenant);
        let sql = format!("select doc from {table} where id = $1");
        let row: Option<(SqlJson<TestDefinition>,)> = sqlx::query_as(&sql)
            .bind(suite_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        row.map(|(doc,)| doc.0)
            .ok_or_else(|| AppError::data_shape("test definition not found"))
    }

    async fn get_history(&self, tenant: &str, suite_id: Uuid) -> AppResult<Vec<HistoryPoint>> {
        let history_table = quoted_table("test_history", tenant);
        let executions_table = quoted_table("test_executions", tenant);
        let sql = format!(
            "select h.value as value, e.executed_on as executed_on \
             from {history_table} h join {executions_table} e on h.execution_id = e.id \
             where h.test_suite_id = $1 \
               and (h.is_anomaly is distinct from true or h.user_feedback_is_anomaly = 0) \
             order by e.executed_on asc"
        );
        let rows: Vec<(f64, DateTime<Utc>)> = sqlx::query_as(&sql)
            .bind(suite_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(rows
            .into_iter()
            .map(|(value, executed_on)| HistoryPoint { executed_on, value })
            .collect())
    }

    async fn get_last_qual_schema(
        &self,
        tenant: &str,
        suite_id: Uuid,
    ) -> AppResult<Option<(Uuid, SchemaMap)>> {
        let history_table = quoted_table("test_history_qual", tenant);
        let executions_table = quoted_table("test_executions_qual", tenant);
        let sql = format!(
            "select h.id as id, h.value as value \
             from {history_table} h join {executions_table} e on h.execution_id = e.id \
             where h.test_suite_id = $1 order by e.executed_on desc limit 1"
        );
        let row: Option<(Uuid, SqlJson<SchemaMap>)> = sqlx::query_as(&sql)
            .bind(suite_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(row.map(|(id, doc)| (id, doc.0)))
    }

    async fn insert_execution(
        &self,
        tenant: &str,
        kind: TestKind,
        record: &ExecutionRecord,
    ) -> AppResult<()> {
        let table = quoted_table(executions_base(kind), tenant);
        let sql = format!("insert into {table} (id, test_suite_id, executed_on) values ($1, $2, $3)");
        let result = sqlx::query(&sql)
            .bind(record.id)
            .bind(record.test_suite_id)
            .bind(record.executed_on)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(result.rows_affected(), "execution insert")
    }

    async fn insert_quant_result(
        &self,
        tenant: &str,
        suite_id: Uuid,
        execution_id: Uuid,
        result: &QuantResultRecord,
    ) -> AppResult<()> {
        let table = quoted_table("test_results", tenant);
        let sql = format!(
            "insert into {table} (id, test_suite_id, execution_id, doc) values ($1, $2, $3, $4)"
        );
        let outcome = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(suite_id)
            .bind(execution_id)
            .bind(SqlJson(result))
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "quantitative result insert")
    }

    async fn insert_qual_result(
        &self,
        tenant: &str,
        suite_id: Uuid,
        execution_id: Uuid,
        result: &QualResultRecord,
    ) -> AppResult<()> {
        let table = quoted_table("test_results_qual", tenant);
        let sql = format!(
            "insert into {table} (id, test_suite_id, execution_id, doc) values ($1, $2, $3, $4)"
        );
        let outcome = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(suite_id)
            .bind(execution_id)
            .bind(SqlJson(result))
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "qualitative result insert")
    }

    async fn insert_quant_history(&self, tenant: &str, entry: &QuantHistoryEntry) -> AppResult<()> {
        let table = quoted_table("test_history", tenant);
        let sql = format!(
            "insert into {table} \
             (id, test_suite_id, execution_id, value, is_anomaly, user_feedback_is_anomaly, alert_id) \
             values ($1, $2, $3, $4, $5, $6, $7)"
        );
        let outcome = sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.test_suite_id)
            .bind(entry.execution_id)
            .bind(entry.value)
            .bind(entry.is_anomalous)
            .bind(entry.user_feedback.as_i8())
            .bind(entry.alert_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "quantitative history insert")
    }

    async fn insert_qual_history(&self, tenant: &str, entry: &QualHistoryEntry) -> AppResult<()> {
        let table = quoted_table("test_history_qual", tenant);
        let sql = format!(
            "insert into {table} (id, test_suite_id, execution_id, value, is_identical, alert_id) \
             values ($1, $2, $3, $4, $5, $6)"
        );
        let outcome = sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.test_suite_id)
            .bind(entry.execution_id)
            .bind(SqlJson(&entry.value))
            .bind(entry.is_identical)
            .bind(entry.alert_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "qualitative history insert")
    }

    async fn insert_alert(&self, tenant: &str, kind: TestKind, alert: &Alert) -> AppResult<()> {
        let table = quoted_table(alerts_base(kind), tenant);
        let sql = format!(
            "insert into {table} (id, test_suite_id, execution_id, message) values ($1, $2, $3, $4)"
        );
        let outcome = sqlx::query(&sql)
            .bind(alert.id)
            .bind(alert.test_suite_id)
            .bind(alert.execution_id)
            .bind(&alert.message)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "alert insert")
    }

    async fn update_last_alert_sent(
        &self,
        tenant: &str,
        suite_id: Uuid,
        kind: TestKind,
        sent_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let table = quoted_table(suite_base(kind), tenant);
        let sql = format!(
            "update {table} set doc = jsonb_set(doc, '{{lastAlertSent}}', to_jsonb($2::timestamptz)) \
             where id = $1"
        );
        let outcome = sqlx::query(&sql)
            .bind(suite_id)
            .bind(sent_at)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Self::require_one_row_affected(outcome.rows_affected(), "lastAlertSent update")
    }
}
