//! The narrow document-store contract the executor depends on.
//! `Storage` is intentionally typed per collection rather than a single
//! generic `insertDoc(collection, doc)` call — the Postgres realization
//! gives each collection its own table and row shape, so the generic
//! contract collapses into one method per entity while preserving the
//! same collection-by-collection semantics.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Alert, ExecutionRecord, HistoryPoint, QualHistoryEntry, QualResultRecord, QuantHistoryEntry,
    QuantResultRecord, SchemaMap, TestDefinition, TestKind,
};
use crate::error::AppResult;

pub use postgres::PostgresStorage;

/// Builds the tenant-suffixed table name for a logical collection, the
/// per-tenant isolation model every collection follows.
pub fn collection_table(base: &str, tenant: &str) -> String {
    format!("{base}_{tenant}")
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Selects `test_suites`, `test_suites_qual` or `test_suites_custom`
    /// depending on `kind`. Fails if zero or more than one row matches.
    async fn get_test_definition(
        &self,
        tenant: &str,
        suite_id: Uuid,
        kind: TestKind,
    ) -> AppResult<TestDefinition>;

    /// Ascending by `executed_on`, excluding rows flagged anomalous unless
    /// explicitly overridden by a confirmed-non-anomaly feedback value.
    async fn get_history(&self, tenant: &str, suite_id: Uuid) -> AppResult<Vec<HistoryPoint>>;

    /// Most recent schema snapshot, or `None` on a suite's first run.
    async fn get_last_qual_schema(
        &self,
        tenant: &str,
        suite_id: Uuid,
    ) -> AppResult<Option<(Uuid, SchemaMap)>>;

    async fn insert_execution(
        &self,
        tenant: &str,
        kind: TestKind,
        record: &ExecutionRecord,
    ) -> AppResult<()>;

    async fn insert_quant_result(
        &self,
        tenant: &str,
        suite_id: Uuid,
        execution_id: Uuid,
        result: &QuantResultRecord,
    ) -> AppResult<()>;

    async fn insert_qual_result(
        &self,
        tenant: &str,
        suite_id: Uuid,
        execution_id: Uuid,
        result: &QualResultRecord,
    ) -> AppResult<()>;

    async fn insert_quant_history(&self, tenant: &str, entry: &QuantHistoryEntry) -> AppResult<()>;

    async fn insert_qual_history(&self, tenant: &str, entry: &QualHistoryEntry) -> AppResult<()>;

    async fn insert_alert(&self, tenant: &str, kind: TestKind, alert: &Alert) -> AppResult<()>;

    /// Must update exactly one row; fails otherwise.
    async fn update_last_alert_sent(
        &self,
        tenant: &str,
        suite_id: Uuid,
        kind: TestKind,
        sent_at: DateTime<Utc>,
    ) -> AppResult<()>;
}
