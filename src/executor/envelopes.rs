//! Tagged execution-result envelopes, one per dispatch branch: a small sum
//! type rather than an inheritance ladder.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{MaterializationType, SchemaDiff, TestKind};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnomalyDetail {
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantTestData {
    pub executed_on: DateTime<Utc>,
    pub detected_value: f64,
    pub expected_upper_bound: f64,
    pub expected_lower_bound: f64,
    pub modified_z_score: Option<f64>,
    pub deviation: f64,
    pub anomaly: Option<AnomalyDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantAlertData {
    pub alert_id: Uuid,
    pub message: String,
    pub database_name: String,
    pub schema_name: String,
    pub materialization_name: String,
    pub materialization_type: MaterializationType,
    pub expected_value: f64,
    pub column_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantExecutionResult {
    pub test_suite_id: Uuid,
    pub test_type: TestKind,
    pub execution_id: Uuid,
    pub target_resource_id: Option<String>,
    pub organization_id: Uuid,
    pub is_warmup: bool,
    pub test_data: Option<QuantTestData>,
    pub alert_data: Option<QuantAlertData>,
    pub last_alert_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualTestData {
    pub executed_on: DateTime<Utc>,
    pub deviations: Vec<SchemaDiff>,
    pub is_identical: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualAlertData {
    pub alert_id: Uuid,
    pub message: String,
    pub database_name: String,
    pub schema_name: String,
    pub materialization_name: String,
    pub materialization_type: MaterializationType,
    pub deviations: Vec<SchemaDiff>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualExecutionResult {
    pub test_suite_id: Uuid,
    pub test_type: TestKind,
    pub execution_id: Uuid,
    pub target_resource_id: Option<String>,
    pub organization_id: Uuid,
    pub test_data: QualTestData,
    pub alert_data: Option<QualAlertData>,
    pub last_alert_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTestData {
    pub executed_on: DateTime<Utc>,
    pub metric_name: String,
    pub detected_value: f64,
    pub expected_upper_bound: f64,
    pub expected_lower_bound: f64,
    pub modified_z_score: Option<f64>,
    pub deviation: f64,
    pub anomaly: Option<AnomalyDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAlertData {
    pub alert_id: Uuid,
    pub message: String,
    pub expected_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomExecutionResult {
    pub test_suite_id: Uuid,
    pub test_type: TestKind,
    pub execution_id: Uuid,
    pub target_resource_ids: Vec<String>,
    pub organization_id: Uuid,
    pub is_warmup: bool,
    pub test_data: Option<CustomTestData>,
    pub alert_data: Option<CustomAlertData>,
    pub last_alert_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExecutionEnvelope {
    Quant(QuantExecutionResult),
    Qual(QualExecutionResult),
    Custom(CustomExecutionResult),
}
