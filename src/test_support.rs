//! In-memory test doubles for `Storage`, `Warehouse` and `AlertWebhook`,
//! used by unit tests across the crate so `Executor::execute` can be
//! exercised end to end without a real database or warehouse.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::domain::{
    Alert, ExecutionRecord, HistoryPoint, MaterializationType, QualHistoryEntry, QualResultRecord,
    QuantHistoryEntry, QuantResultRecord, SchemaMap, TestDefinition, TestKind, UserFeedback,
};
use crate::error::{AppError, AppResult};
use crate::external::{AlertPayload, AlertWebhook, Warehouse, WarehouseRow};
use crate::storage::Storage;

/// A `TestDefinition` with every optional field empty. Fixture builders
/// below fill in what each test kind needs.
pub fn bare_definition(id: Uuid, test_kind: TestKind) -> TestDefinition {
    TestDefinition {
        id,
        test_kind,
        target_resource_id: None,
        database_name: None,
        schema_name: None,
        materialization_name: None,
        materialization_type: None,
        column_name: None,
        sql_logic: None,
        target_resource_ids: Vec::new(),
        custom_lower_threshold: None,
        custom_upper_threshold: None,
        feedback_lower_threshold: None,
        feedback_upper_threshold: None,
        last_alert_sent: None,
    }
}

pub fn materialization_definition(id: Uuid, test_kind: TestKind) -> TestDefinition {
    TestDefinition {
        database_name: Some("DB".to_string()),
        schema_name: Some("PUBLIC".to_string()),
        materialization_name: Some("ORDERS".to_string()),
        materialization_type: Some(MaterializationType::Table),
        target_resource_id: Some("res-1".to_string()),
        ..bare_definition(id, test_kind)
    }
}

pub fn column_definition(id: Uuid, test_kind: TestKind) -> TestDefinition {
    TestDefinition {
        column_name: Some("AMOUNT".to_string()),
        ..materialization_definition(id, test_kind)
    }
}

#[derive(Default)]
struct Tables {
    definitions: BTreeMap<(String, Uuid), TestDefinition>,
    quant_history: BTreeMap<(String, Uuid), Vec<QuantHistoryEntry>>,
    qual_history: BTreeMap<(String, Uuid), Vec<QualHistoryEntry>>,
    quant_results: Vec<(Uuid, QuantResultRecord)>,
    qual_results: Vec<(Uuid, QualResultRecord)>,
    alerts: Vec<Alert>,
}

/// A fully in-process `Storage`, keyed by `(tenant, suite_id)` the way the
/// Postgres adapter keys by tenant-suffixed table plus `test_suite_id`.
#[derive(Default)]
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_definition(&self, tenant: &str, definition: TestDefinition) {
        self.tables
            .lock()
            .unwrap()
            .definitions
            .insert((tenant.to_string(), definition.id), definition);
    }

    /// Seeds `values.len()` quantitative history points, one per day,
    /// ending the day before `at`.
    pub fn seed_quant_history(&self, tenant: &str, suite_id: Uuid, values: &[f64], at: DateTime<Utc>) {
        let mut tables = self.tables.lock().unwrap();
        let entries = tables.quant_history.entry((tenant.to_string(), suite_id)).or_default();
        for (i, &value) in values.iter().enumerate() {
            entries.push(QuantHistoryEntry {
                id: Uuid::new_v4(),
                test_kind: TestKind::MaterializationRowCount,
                value,
                is_anomalous: false,
                user_feedback: UserFeedback::Unset,
                test_suite_id: suite_id,
                execution_id: Uuid::new_v4(),
                alert_id: None,
                executed_on: at - ChronoDuration::days((values.len() - i) as i64),
            });
        }
    }

    pub fn last_alert_sent(&self, tenant: &str, suite_id: Uuid) -> Option<DateTime<Utc>> {
        self.tables
            .lock()
            .unwrap()
            .definitions
            .get(&(tenant.to_string(), suite_id))
            .and_then(|def| def.last_alert_sent)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.tables.lock().unwrap().alerts.clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_test_definition(&self, tenant: &str, suite_id: Uuid, _kind: TestKind) -> AppResult<TestDefinition> {
        self.tables
            .lock()
            .unwrap()
            .definitions
            .get(&(tenant.to_string(), suite_id))
            .cloned()
            .ok_or_else(|| AppError::data_shape("no test definition for suite"))
    }

    async fn get_history(&self, tenant: &str, suite_id: Uuid) -> AppResult<Vec<HistoryPoint>> {
        let tables = self.tables.lock().unwrap();
        let mut points: Vec<HistoryPoint> = tables
            .quant_history
            .get(&(tenant.to_string(), suite_id))
            .into_iter()
            .flatten()
            .filter(|entry| !entry.is_anomalous || entry.user_feedback.overrides_anomaly_flag())
            .map(|entry| HistoryPoint {
                executed_on: entry.executed_on,
                value: entry.value,
            })
            .collect();
        points.sort_by_key(|p| p.executed_on);
        Ok(points)
    }

    async fn get_last_qual_schema(&self, tenant: &str, suite_id: Uuid) -> AppResult<Option<(Uuid, SchemaMap)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .qual_history
            .get(&(tenant.to_string(), suite_id))
            .and_then(|entries| entries.last())
            .map(|entry| (entry.id, entry.value.clone())))
    }

    async fn insert_execution(&self, _tenant: &str, _kind: TestKind, _record: &ExecutionRecord) -> AppResult<()> {
        Ok(())
    }

    async fn insert_quant_result(
        &self,
        _tenant: &str,
        _suite_id: Uuid,
        execution_id: Uuid,
        result: &QuantResultRecord,
    ) -> AppResult<()> {
        self.tables.lock().unwrap().quant_results.push((execution_id, result.clone()));
        Ok(())
    }

    async fn insert_qual_result(
        &self,
        _tenant: &str,
        _suite_id: Uuid,
        execution_id: Uuid,
        result: &QualResultRecord,
    ) -> AppResult<()> {
        self.tables.lock().unwrap().qual_results.push((execution_id, result.clone()));
        Ok(())
    }

    async fn insert_quant_history(&self, tenant: &str, entry: &QuantHistoryEntry) -> AppResult<()> {
        self.tables
            .lock()
            .unwrap()
            .quant_history
            .entry((tenant.to_string(), entry.test_suite_id))
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn insert_qual_history(&self, tenant: &str, entry: &QualHistoryEntry) -> AppResult<()> {
        self.tables
            .lock()
            .unwrap()
            .qual_history
            .entry((tenant.to_string(), entry.test_suite_id))
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn insert_alert(&self, _tenant: &str, _kind: TestKind, alert: &Alert) -> AppResult<()> {
        self.tables.lock().unwrap().alerts.push(alert.clone());
        Ok(())
    }

    async fn update_last_alert_sent(
        &self,
        tenant: &str,
        suite_id: Uuid,
        _kind: TestKind,
        sent_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let def = tables
            .definitions
            .get_mut(&(tenant.to_string(), suite_id))
            .ok_or_else(|| AppError::data_shape("no test definition for suite"))?;
        def.last_alert_sent = Some(sent_at);
        Ok(())
    }
}

/// A `Warehouse` double that returns the same fixed row(s) for every query.
pub struct FixedWarehouse {
    rows: Vec<WarehouseRow>,
}

impl FixedWarehouse {
    pub fn single_value(column: &str, value: f64) -> Self {
        let mut row = BTreeMap::new();
        row.insert(column.to_string(), serde_json::json!(value));
        Self {
            rows: vec![WarehouseRow(row)],
        }
    }

    pub fn rows(rows: Vec<WarehouseRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl Warehouse for FixedWarehouse {
    async fn query(&self, _organization_id: Uuid, _sql: &str) -> AppResult<Vec<WarehouseRow>> {
        Ok(self.rows.clone())
    }
}

/// An `AlertWebhook` double that records every payload it receives.
#[derive(Default)]
pub struct RecordingWebhook {
    sent: Mutex<Vec<AlertPayload>>,
}

impl RecordingWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<AlertPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertWebhook for RecordingWebhook {
    async fn notify(&self, alert: &AlertPayload) -> AppResult<()> {
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
