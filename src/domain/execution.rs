use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::test_definition::TestKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub executed_on: DateTime<Utc>,
    pub test_suite_id: Uuid,
}

/// Tri-state feedback a user can leave on a history entry. Carried
/// internally as an enum and serialized to a legacy `-1/0/1` integer
/// encoding only at the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserFeedback {
    #[default]
    Unset,
    ConfirmedAnomaly,
    ConfirmedNotAnomaly,
}

impl UserFeedback {
    pub fn from_i8(value: i8) -> Self {
        match value {
            1 => UserFeedback::ConfirmedAnomaly,
            0 => UserFeedback::ConfirmedNotAnomaly,
            _ => UserFeedback::Unset,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            UserFeedback::Unset => -1,
            UserFeedback::ConfirmedAnomaly => 1,
            UserFeedback::ConfirmedNotAnomaly => 0,
        }
    }

    /// An explicit "not anomaly" feedback overrides a stored anomaly flag
    /// when the storage adapter loads history.
    pub fn overrides_anomaly_flag(self) -> bool {
        matches!(self, UserFeedback::ConfirmedNotAnomaly)
    }
}

#[derive(Debug, Clone)]
pub struct QuantHistoryEntry {
    pub id: Uuid,
    pub test_kind: TestKind,
    pub value: f64,
    pub is_anomalous: bool,
    pub user_feedback: UserFeedback,
    pub test_suite_id: Uuid,
    pub execution_id: Uuid,
    pub alert_id: Option<Uuid>,
    pub executed_on: DateTime<Utc>,
}

/// A single warehouse measurement point used by `getHistory` (only the
/// timestamp and value are projected).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub executed_on: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub column_name: String,
    pub data_type: String,
    pub is_identity: bool,
    pub is_nullable: bool,
    pub ordinal_position: u32,
}

/// Schema snapshot keyed by 1-based ordinal position, string-typed so it
/// round-trips through a JSON document column unchanged.
pub type SchemaMap = std::collections::BTreeMap<String, ColumnDef>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    pub column_name: (Option<String>, Option<String>),
    pub ordinal_position: (Option<u32>, Option<u32>),
    pub data_type: Option<(Option<String>, Option<String>)>,
    pub is_identity: Option<(Option<bool>, Option<bool>)>,
    pub is_nullable: Option<(Option<bool>, Option<bool>)>,
}

#[derive(Debug, Clone)]
pub struct QualHistoryEntry {
    pub id: Uuid,
    pub value: SchemaMap,
    pub is_identical: bool,
    pub test_suite_id: Uuid,
    pub execution_id: Uuid,
    pub alert_id: Option<Uuid>,
}

/// Statistics persisted for a quantitative run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantResultRecord {
    pub mean_ad: Option<f64>,
    pub median_ad: f64,
    pub modified_z_score: f64,
    pub expected_value: f64,
    pub expected_upper: f64,
    pub expected_lower: f64,
    pub deviation: f64,
    pub is_anomalous: bool,
    pub importance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualResultRecord {
    pub expected_value: Option<SchemaMap>,
    pub deviation: Vec<SchemaDiff>,
    pub is_identical: bool,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub id: Uuid,
    pub test_kind: TestKind,
    pub message: String,
    pub test_suite_id: Uuid,
    pub execution_id: Uuid,
}
