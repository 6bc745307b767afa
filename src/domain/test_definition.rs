use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed, tagged enum standing in for what was historically a
/// magic-string `test_type` column. Absence of `test_type` on a stored
/// definition resolves to `Custom` at the storage boundary, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TestKind {
    MaterializationRowCount,
    MaterializationColumnCount,
    MaterializationFreshness,
    ColumnCardinality,
    ColumnDistribution,
    ColumnFreshness,
    ColumnNullness,
    ColumnUniqueness,
    MaterializationSchemaChange,
    Custom,
}

impl TestKind {
    pub fn is_quantitative(self) -> bool {
        matches!(
            self,
            TestKind::MaterializationRowCount
                | TestKind::MaterializationColumnCount
                | TestKind::MaterializationFreshness
                | TestKind::ColumnCardinality
                | TestKind::ColumnDistribution
                | TestKind::ColumnFreshness
                | TestKind::ColumnNullness
                | TestKind::ColumnUniqueness
        )
    }

    pub fn is_qualitative(self) -> bool {
        matches!(self, TestKind::MaterializationSchemaChange)
    }

    pub fn is_custom(self) -> bool {
        matches!(self, TestKind::Custom)
    }

    pub fn is_column_kind(self) -> bool {
        matches!(
            self,
            TestKind::ColumnCardinality
                | TestKind::ColumnDistribution
                | TestKind::ColumnFreshness
                | TestKind::ColumnNullness
                | TestKind::ColumnUniqueness
        )
    }

    /// The column name a warehouse result row must carry for this kind, per
    /// the SQL contracts. `Custom` has no fixed name — it is read positionally
    /// as the row's single column.
    pub fn result_column_name(self) -> Option<&'static str> {
        match self {
            TestKind::MaterializationRowCount => Some("ROW_COUNT"),
            TestKind::MaterializationColumnCount => Some("COLUMN_COUNT"),
            TestKind::MaterializationFreshness | TestKind::ColumnFreshness => Some("TIME_DIFF"),
            TestKind::ColumnCardinality => Some("DISTINCT_VALUE_COUNT"),
            TestKind::ColumnDistribution => Some("MEDIAN"),
            TestKind::ColumnNullness => Some("NULLNESS_RATE"),
            TestKind::ColumnUniqueness => Some("UNIQUENESS_RATE"),
            TestKind::MaterializationSchemaChange | TestKind::Custom => None,
        }
    }

    /// Every metric clamps its non-negativity floor to 0 except these two,
    /// whose values are legitimately signed (a distribution median, a time
    /// delta that can run negative).
    pub fn exempt_from_nonnegativity_clamp(self) -> bool {
        matches!(self, TestKind::ColumnDistribution | TestKind::ColumnFreshness)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterializationType {
    Table,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdMode {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdSource {
    Custom,
    Feedback,
}

/// A user- or feedback-supplied bound that overrides a model-derived bound
/// on one side. `custom` always wins over `feedback` when both are present
/// on a definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedThreshold {
    pub value: f64,
    pub mode: ThresholdMode,
    pub source: ThresholdSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedThresholds {
    pub lower: Option<ForcedThreshold>,
    pub upper: Option<ForcedThreshold>,
}

impl ForcedThresholds {
    pub fn none() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }
}

/// Per-suite configuration, read-only to the core except for the
/// `last_alert_sent` update performed at the end of a normal-path anomaly
/// run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    pub id: Uuid,
    pub test_kind: TestKind,
    pub target_resource_id: Option<String>,

    // Built-in (mat/column) kinds.
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
    pub materialization_name: Option<String>,
    pub materialization_type: Option<MaterializationType>,
    pub column_name: Option<String>,

    // Custom kind.
    pub sql_logic: Option<String>,
    pub target_resource_ids: Vec<String>,

    pub custom_lower_threshold: Option<ForcedThreshold>,
    pub custom_upper_threshold: Option<ForcedThreshold>,
    pub feedback_lower_threshold: Option<ForcedThreshold>,
    pub feedback_upper_threshold: Option<ForcedThreshold>,

    pub last_alert_sent: Option<chrono::DateTime<chrono::Utc>>,
}

impl TestDefinition {
    /// Composes the forced-threshold pair the model consumes: custom
    /// overrides feedback on each side independently.
    pub fn forced_thresholds(&self) -> ForcedThresholds {
        ForcedThresholds {
            lower: self.custom_lower_threshold.or(self.feedback_lower_threshold),
            upper: self.custom_upper_threshold.or(self.feedback_upper_threshold),
        }
    }
}
