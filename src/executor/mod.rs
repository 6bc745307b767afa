//! The state machine that ties the other modules together: resolve
//! tenancy, read the test definition, dispatch on its kind, run the
//! model, and persist the results in the required order (`Execution`
//! before `Result`/`History`/`Alert`, `Alert` before the `History` that
//! references it, `lastAlertSent` updated only after `Alert` insertion).
//! One execution per invocation, no intra-execution parallelism — this is
//! the only module that talks to `Storage`, `Warehouse` and `AlertWebhook`.

pub mod dispatch;
pub mod envelopes;
pub mod message;

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{
    Alert, ColumnDef, ExecutionRecord, MaterializationType, QualHistoryEntry, QualResultRecord,
    QuantHistoryEntry, QuantResultRecord, SchemaMap, TestDefinition, TestKind, UserFeedback,
};
use crate::error::{AppError, AppResult};
use crate::external::{query_single_row, AlertPayload, AlertWebhook, AuthClaims, Warehouse};
use crate::model;
use crate::storage::Storage;

pub use dispatch::ExecuteRequest;
pub use envelopes::ExecutionEnvelope;
use envelopes::{
    AnomalyDetail, CustomAlertData, CustomExecutionResult, CustomTestData, QualAlertData,
    QualExecutionResult, QualTestData, QuantAlertData, QuantExecutionResult, QuantTestData,
};

pub struct Executor {
    storage: Arc<dyn Storage>,
    warehouse: Arc<dyn Warehouse>,
    webhook: Arc<dyn AlertWebhook>,
    warmup_max_samples: usize,
    warmup_max_days: i64,
    importance_threshold: f64,
    alert_resend_cooldown: ChronoDuration,
}

impl Executor {
    pub fn new(
        storage: Arc<dyn Storage>,
        warehouse: Arc<dyn Warehouse>,
        webhook: Arc<dyn AlertWebhook>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            storage,
            warehouse,
            webhook,
            warmup_max_samples: config.warmup_sample_threshold,
            warmup_max_days: config.warmup_day_threshold,
            importance_threshold: config.importance_threshold,
            alert_resend_cooldown: ChronoDuration::hours(config.alert_resend_cooldown_hours),
        }
    }

    pub async fn execute(&self, request: ExecuteRequest, auth: AuthClaims) -> AppResult<ExecutionEnvelope> {
        let organization_id = dispatch::resolve_organization(&request, &auth)?;
        let tenant = organization_id.to_string();
        let definition = self
            .storage
            .get_test_definition(&tenant, request.test_suite_id, request.test_kind)
            .await?;

        if request.test_kind.is_qualitative() {
            self.execute_qualitative(&tenant, organization_id, &request, &definition).await
        } else if request.test_kind.is_custom() {
            self.execute_custom(&tenant, organization_id, &request, &definition).await
        } else {
            self.execute_quantitative(&tenant, organization_id, &request, &definition).await
        }
    }

    async fn execute_quantitative(
        &self,
        tenant: &str,
        organization_id: Uuid,
        request: &ExecuteRequest,
        definition: &TestDefinition,
    ) -> AppResult<ExecutionEnvelope> {
        let sql = dispatch::build_metric_sql(definition)?;
        let row = query_single_row(self.warehouse.as_ref(), organization_id, &sql).await?;
        let column = request
            .test_kind
            .result_column_name()
            .expect("built-in quantitative kinds always name a result column");
        let y = row.get_f64(column)?;
        let now = Utc::now();

        let history = self.storage.get_history(tenant, request.test_suite_id).await?;

        let execution = ExecutionRecord {
            id: Uuid::new_v4(),
            executed_on: now,
            test_suite_id: request.test_suite_id,
        };
        self.storage.insert_execution(tenant, request.test_kind, &execution).await?;

        if is_warmup(
            history.len(),
            history.first().map(|p| p.executed_on),
            now,
            self.warmup_max_samples,
            self.warmup_max_days,
        ) {
            self.storage
                .insert_quant_history(
                    tenant,
                    &QuantHistoryEntry {
                        id: Uuid::new_v4(),
                        test_kind: request.test_kind,
                        value: y,
                        is_anomalous: false,
                        user_feedback: UserFeedback::Unset,
                        test_suite_id: request.test_suite_id,
                        execution_id: execution.id,
                        alert_id: None,
                        executed_on: now,
                    },
                )
                .await?;
            return Ok(ExecutionEnvelope::Quant(QuantExecutionResult {
                test_suite_id: request.test_suite_id,
                test_type: request.test_kind,
                execution_id: execution.id,
                target_resource_id: definition.target_resource_id.clone(),
                organization_id,
                is_warmup: true,
                test_data: None,
                alert_data: None,
                last_alert_sent: definition.last_alert_sent,
            }));
        }

        let forced = definition.forced_thresholds();
        let history_values: Vec<f64> = history.iter().map(|p| p.value).collect();
        let z = model::analyze_zscore(&history_values, y, request.test_kind, forced);
        let forecast = model::forecast::fit(&history, now)
            .map(|components| model::analyze_forecast(components, y, request.test_kind, forced, z.median));
        let outcome = model::fuse(z, forecast, y, self.importance_threshold);

        self.storage
            .insert_quant_result(
                tenant,
                request.test_suite_id,
                execution.id,
                &QuantResultRecord {
                    mean_ad: outcome.mean_ad,
                    median_ad: outcome.median_ad,
                    modified_z_score: outcome.modified_z_score,
                    expected_value: outcome.expected_value,
                    expected_upper: outcome.expected_upper,
                    expected_lower: outcome.expected_lower,
                    deviation: outcome.deviation,
                    is_anomalous: outcome.is_anomalous,
                    importance: outcome.importance,
                },
            )
            .await?;

        let mut last_alert_sent = definition.last_alert_sent;
        let mut alert_id = None;
        let mut alert_data = None;

        if outcome.is_anomalous {
            let id = Uuid::new_v4();
            let ctx = message::TargetContext {
                target_resource_id: definition.target_resource_id.as_deref().unwrap_or_default(),
                database_name: definition.database_name.as_deref().unwrap_or_default(),
                schema_name: definition.schema_name.as_deref().unwrap_or_default(),
                materialization_name: definition.materialization_name.as_deref().unwrap_or_default(),
                column_name: definition.column_name.as_deref(),
            };
            let message_text = message::anomaly_message(request.test_kind, &ctx);
            self.storage
                .insert_alert(
                    tenant,
                    request.test_kind,
                    &Alert {
                        id,
                        test_kind: request.test_kind,
                        message: message_text.clone(),
                        test_suite_id: request.test_suite_id,
                        execution_id: execution.id,
                    },
                )
                .await?;

            let sent_at = next_alert_sent(definition.last_alert_sent, now, self.alert_resend_cooldown);
            self.storage
                .update_last_alert_sent(tenant, request.test_suite_id, request.test_kind, sent_at)
                .await?;
            last_alert_sent = Some(sent_at);

            let _ = self
                .webhook
                .notify(&AlertPayload {
                    alert_id: id,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    organization_id,
                    message: message_text.clone(),
                })
                .await;

            alert_data = Some(QuantAlertData {
                alert_id: id,
                message: message_text,
                database_name: definition.database_name.clone().unwrap_or_default(),
                schema_name: definition.schema_name.clone().unwrap_or_default(),
                materialization_name: definition.materialization_name.clone().unwrap_or_default(),
                materialization_type: definition.materialization_type.unwrap_or(MaterializationType::Table),
                expected_value: outcome.expected_value,
                column_name: definition.column_name.clone(),
            });
            alert_id = Some(id);
        }

        self.storage
            .insert_quant_history(
                tenant,
                &QuantHistoryEntry {
                    id: Uuid::new_v4(),
                    test_kind: request.test_kind,
                    value: y,
                    is_anomalous: outcome.is_anomalous,
                    user_feedback: UserFeedback::Unset,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    alert_id,
                    executed_on: now,
                },
            )
            .await?;

        Ok(ExecutionEnvelope::Quant(QuantExecutionResult {
            test_suite_id: request.test_suite_id,
            test_type: request.test_kind,
            execution_id: execution.id,
            target_resource_id: definition.target_resource_id.clone(),
            organization_id,
            is_warmup: false,
            test_data: Some(QuantTestData {
                executed_on: now,
                detected_value: y,
                expected_upper_bound: outcome.expected_upper,
                expected_lower_bound: outcome.expected_lower,
                modified_z_score: finite(outcome.modified_z_score),
                deviation: outcome.deviation,
                anomaly: outcome
                    .is_anomalous
                    .then(|| AnomalyDetail { importance: outcome.importance.unwrap_or(0.0) }),
            }),
            alert_data,
            last_alert_sent,
        }))
    }

    async fn execute_custom(
        &self,
        tenant: &str,
        organization_id: Uuid,
        request: &ExecuteRequest,
        definition: &TestDefinition,
    ) -> AppResult<ExecutionEnvelope> {
        let sql_logic = dispatch::require_field(definition.sql_logic.as_deref(), "sqlLogic")?;
        let row = query_single_row(self.warehouse.as_ref(), organization_id, sql_logic).await?;
        let (metric_name, y) = row.only_value()?;
        let now = Utc::now();

        let history = self.storage.get_history(tenant, request.test_suite_id).await?;

        let execution = ExecutionRecord {
            id: Uuid::new_v4(),
            executed_on: now,
            test_suite_id: request.test_suite_id,
        };
        self.storage.insert_execution(tenant, request.test_kind, &execution).await?;

        if is_warmup(
            history.len(),
            history.first().map(|p| p.executed_on),
            now,
            self.warmup_max_samples,
            self.warmup_max_days,
        ) {
            self.storage
                .insert_quant_history(
                    tenant,
                    &QuantHistoryEntry {
                        id: Uuid::new_v4(),
                        test_kind: request.test_kind,
                        value: y,
                        is_anomalous: false,
                        user_feedback: UserFeedback::Unset,
                        test_suite_id: request.test_suite_id,
                        execution_id: execution.id,
                        alert_id: None,
                        executed_on: now,
                    },
                )
                .await?;
            return Ok(ExecutionEnvelope::Custom(CustomExecutionResult {
                test_suite_id: request.test_suite_id,
                test_type: request.test_kind,
                execution_id: execution.id,
                target_resource_ids: definition.target_resource_ids.clone(),
                organization_id,
                is_warmup: true,
                test_data: None,
                alert_data: None,
                last_alert_sent: definition.last_alert_sent,
            }));
        }

        let forced = definition.forced_thresholds();
        let history_values: Vec<f64> = history.iter().map(|p| p.value).collect();
        let z = model::analyze_zscore(&history_values, y, request.test_kind, forced);
        let forecast = model::forecast::fit(&history, now)
            .map(|components| model::analyze_forecast(components, y, request.test_kind, forced, z.median));
        let outcome = model::fuse(z, forecast, y, self.importance_threshold);

        self.storage
            .insert_quant_result(
                tenant,
                request.test_suite_id,
                execution.id,
                &QuantResultRecord {
                    mean_ad: outcome.mean_ad,
                    median_ad: outcome.median_ad,
                    modified_z_score: outcome.modified_z_score,
                    expected_value: outcome.expected_value,
                    expected_upper: outcome.expected_upper,
                    expected_lower: outcome.expected_lower,
                    deviation: outcome.deviation,
                    is_anomalous: outcome.is_anomalous,
                    importance: outcome.importance,
                },
            )
            .await?;

        let mut last_alert_sent = definition.last_alert_sent;
        let mut alert_id = None;
        let mut alert_data = None;

        if outcome.is_anomalous {
            let id = Uuid::new_v4();
            let message_text = message::custom_metric_message(&metric_name);
            self.storage
                .insert_alert(
                    tenant,
                    request.test_kind,
                    &Alert {
                        id,
                        test_kind: request.test_kind,
                        message: message_text.clone(),
                        test_suite_id: request.test_suite_id,
                        execution_id: execution.id,
                    },
                )
                .await?;

            let sent_at = next_alert_sent(definition.last_alert_sent, now, self.alert_resend_cooldown);
            self.storage
                .update_last_alert_sent(tenant, request.test_suite_id, request.test_kind, sent_at)
                .await?;
            last_alert_sent = Some(sent_at);

            let _ = self
                .webhook
                .notify(&AlertPayload {
                    alert_id: id,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    organization_id,
                    message: message_text.clone(),
                })
                .await;

            alert_data = Some(CustomAlertData {
                alert_id: id,
                message: message_text,
                expected_value: outcome.expected_value,
            });
            alert_id = Some(id);
        }

        self.storage
            .insert_quant_history(
                tenant,
                &QuantHistoryEntry {
                    id: Uuid::new_v4(),
                    test_kind: request.test_kind,
                    value: y,
                    is_anomalous: outcome.is_anomalous,
                    user_feedback: UserFeedback::Unset,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    alert_id,
                    executed_on: now,
                },
            )
            .await?;

        Ok(ExecutionEnvelope::Custom(CustomExecutionResult {
            test_suite_id: request.test_suite_id,
            test_type: request.test_kind,
            execution_id: execution.id,
            target_resource_ids: definition.target_resource_ids.clone(),
            organization_id,
            is_warmup: false,
            test_data: Some(CustomTestData {
                executed_on: now,
                metric_name,
                detected_value: y,
                expected_upper_bound: outcome.expected_upper,
                expected_lower_bound: outcome.expected_lower,
                modified_z_score: finite(outcome.modified_z_score),
                deviation: outcome.deviation,
                anomaly: outcome
                    .is_anomalous
                    .then(|| AnomalyDetail { importance: outcome.importance.unwrap_or(0.0) }),
            }),
            alert_data,
            last_alert_sent,
        }))
    }

    async fn execute_qualitative(
        &self,
        tenant: &str,
        organization_id: Uuid,
        request: &ExecuteRequest,
        definition: &TestDefinition,
    ) -> AppResult<ExecutionEnvelope> {
        let sql = dispatch::build_schema_sql(definition)?;
        let rows = self.warehouse.query(organization_id, &sql).await?;

        let mut new_schema = SchemaMap::new();
        for row in &rows {
            let descriptor = row.get_json("COLUMN_DEFINITION")?;
            let column: ColumnDef = serde_json::from_value(descriptor.clone())
                .map_err(|err| AppError::data_shape(format!("malformed column definition: {err}")))?;
            new_schema.insert(column.ordinal_position.to_string(), column);
        }

        let old_schema = self.storage.get_last_qual_schema(tenant, request.test_suite_id).await?;
        let outcome = model::diff_schema(old_schema.as_ref().map(|(_, schema)| schema), &new_schema);

        let now = Utc::now();
        let execution = ExecutionRecord {
            id: Uuid::new_v4(),
            executed_on: now,
            test_suite_id: request.test_suite_id,
        };
        self.storage.insert_execution(tenant, request.test_kind, &execution).await?;

        self.storage
            .insert_qual_result(
                tenant,
                request.test_suite_id,
                execution.id,
                &QualResultRecord {
                    expected_value: old_schema.map(|(_, schema)| schema),
                    deviation: outcome.deviations.clone(),
                    is_identical: outcome.is_identical,
                },
            )
            .await?;

        let mut last_alert_sent = definition.last_alert_sent;
        let mut alert_id = None;
        let mut alert_data = None;

        if !outcome.is_identical {
            let id = Uuid::new_v4();
            let ctx = message::TargetContext {
                target_resource_id: definition.target_resource_id.as_deref().unwrap_or_default(),
                database_name: definition.database_name.as_deref().unwrap_or_default(),
                schema_name: definition.schema_name.as_deref().unwrap_or_default(),
                materialization_name: definition.materialization_name.as_deref().unwrap_or_default(),
                column_name: definition.column_name.as_deref(),
            };
            let message_text = message::anomaly_message(TestKind::MaterializationSchemaChange, &ctx);
            self.storage
                .insert_alert(
                    tenant,
                    request.test_kind,
                    &Alert {
                        id,
                        test_kind: request.test_kind,
                        message: message_text.clone(),
                        test_suite_id: request.test_suite_id,
                        execution_id: execution.id,
                    },
                )
                .await?;

            let sent_at = next_alert_sent(definition.last_alert_sent, now, self.alert_resend_cooldown);
            self.storage
                .update_last_alert_sent(tenant, request.test_suite_id, request.test_kind, sent_at)
                .await?;
            last_alert_sent = Some(sent_at);

            let _ = self
                .webhook
                .notify(&AlertPayload {
                    alert_id: id,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    organization_id,
                    message: message_text.clone(),
                })
                .await;

            alert_data = Some(QualAlertData {
                alert_id: id,
                message: message_text,
                database_name: definition.database_name.clone().unwrap_or_default(),
                schema_name: definition.schema_name.clone().unwrap_or_default(),
                materialization_name: definition.materialization_name.clone().unwrap_or_default(),
                materialization_type: definition.materialization_type.unwrap_or(MaterializationType::Table),
                deviations: outcome.deviations.clone(),
            });
            alert_id = Some(id);
        }

        self.storage
            .insert_qual_history(
                tenant,
                &QualHistoryEntry {
                    id: Uuid::new_v4(),
                    value: new_schema,
                    is_identical: outcome.is_identical,
                    test_suite_id: request.test_suite_id,
                    execution_id: execution.id,
                    alert_id,
                },
            )
            .await?;

        Ok(ExecutionEnvelope::Qual(QualExecutionResult {
            test_suite_id: request.test_suite_id,
            test_type: request.test_kind,
            execution_id: execution.id,
            target_resource_id: definition.target_resource_id.clone(),
            organization_id,
            test_data: QualTestData {
                executed_on: now,
                deviations: outcome.deviations,
                is_identical: outcome.is_identical,
            },
            alert_data,
            last_alert_sent,
        }))
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `N = len(history)`, `D = days(now - history[0].executedOn)` if `N>0`
/// else `0`. Warm-up requires both `N ≤ max_samples` and `D ≤ max_days` —
/// both thresholds must hold, not either alone.
fn is_warmup(
    sample_count: usize,
    earliest: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_samples: usize,
    max_days: i64,
) -> bool {
    let days_span = earliest.map(|t| (now - t).num_days()).unwrap_or(0);
    sample_count <= max_samples && days_span <= max_days
}

/// Unset → now. Otherwise, now only if the gap since the previous send is
/// at least `cooldown`; otherwise unchanged.
fn next_alert_sent(previous: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown: ChronoDuration) -> DateTime<Utc> {
    match previous {
        None => now,
        Some(prev) if now - prev >= cooldown => now,
        Some(prev) => prev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_holds_while_both_sample_count_and_span_are_small() {
        let now = Utc::now();
        assert!(is_warmup(10, Some(now - ChronoDuration::days(2)), now, 30, 7));
        assert!(is_warmup(0, None, now, 30, 7));
    }

    #[test]
    fn warmup_ends_once_either_threshold_is_exceeded() {
        let now = Utc::now();
        assert!(!is_warmup(31, Some(now - ChronoDuration::days(2)), now, 30, 7));
        assert!(!is_warmup(10, Some(now - ChronoDuration::days(8)), now, 30, 7));
    }

    #[test]
    fn alert_resend_respects_the_cooldown_gap() {
        let now = Utc::now();
        let cooldown = ChronoDuration::hours(24);
        assert_eq!(next_alert_sent(None, now, cooldown), now);
        let recent = now - ChronoDuration::hours(1);
        assert_eq!(next_alert_sent(Some(recent), now, cooldown), recent);
        let stale = now - ChronoDuration::hours(25);
        assert_eq!(next_alert_sent(Some(stale), now, cooldown), now);
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use crate::domain::{ForcedThreshold, ThresholdMode, ThresholdSource};
    use crate::test_support::{
        column_definition, materialization_definition, FixedWarehouse, InMemoryStorage, RecordingWebhook,
    };

    const TENANT: &str = "00000000-0000-0000-0000-000000000001";

    fn test_config() -> EngineConfig {
        EngineConfig {
            database_url: String::new(),
            warehouse_api_base_url: String::new(),
            alert_webhook_base_url: None,
            warmup_sample_threshold: 30,
            warmup_day_threshold: 7,
            importance_threshold: model::DEFAULT_IMPORTANCE_THRESHOLD,
            alert_resend_cooldown_hours: 24,
        }
    }

    fn organization_id() -> Uuid {
        TENANT.parse().unwrap()
    }

    fn auth() -> AuthClaims {
        AuthClaims {
            caller_org_id: Some(organization_id()),
            is_system_internal: false,
        }
    }

    /// Wires an `Executor` to a fresh `InMemoryStorage` (returned alongside so
    /// the test can seed history and inspect alerts after the call) and a
    /// `RecordingWebhook` (returned so the test can assert delivery).
    fn quant_harness(warehouse: FixedWarehouse) -> (Executor, Arc<InMemoryStorage>, Arc<RecordingWebhook>) {
        let storage = Arc::new(InMemoryStorage::new());
        let webhook = Arc::new(RecordingWebhook::new());
        let executor = Executor::new(
            storage.clone(),
            Arc::new(warehouse),
            webhook.clone(),
            &test_config(),
        );
        (executor, storage, webhook)
    }

    #[tokio::test]
    async fn empty_history_is_a_warmup_run_with_no_alert() {
        let suite_id = Uuid::new_v4();
        let definition = materialization_definition(suite_id, TestKind::MaterializationRowCount);
        let (executor, storage, webhook) = quant_harness(FixedWarehouse::single_value("ROW_COUNT", 100.0));
        storage.seed_definition(TENANT, definition);

        let request = ExecuteRequest {
            test_suite_id: suite_id,
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: None,
        };
        let envelope = executor.execute(request, auth()).await.unwrap();

        match envelope {
            ExecutionEnvelope::Quant(result) => {
                assert!(result.is_warmup);
                assert!(result.test_data.is_none());
                assert!(result.alert_data.is_none());
            }
            _ => panic!("expected a quantitative envelope"),
        }
        assert!(webhook.sent().is_empty());
        assert!(storage.alerts().is_empty());
    }

    #[tokio::test]
    async fn steady_history_is_not_anomalous() {
        let suite_id = Uuid::new_v4();
        let definition = materialization_definition(suite_id, TestKind::MaterializationRowCount);
        let (executor, storage, webhook) = quant_harness(FixedWarehouse::single_value("ROW_COUNT", 101.0));
        storage.seed_definition(TENANT, definition);
        let now = Utc::now();
        let steady: Vec<f64> = (0..40).map(|i| 100.0 + (i % 3) as f64).collect();
        storage.seed_quant_history(TENANT, suite_id, &steady, now);

        let request = ExecuteRequest {
            test_suite_id: suite_id,
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: None,
        };
        let envelope = executor.execute(request, auth()).await.unwrap();

        match envelope {
            ExecutionEnvelope::Quant(result) => {
                assert!(!result.is_warmup);
                let data = result.test_data.expect("non-warmup run always has test data");
                assert!(data.anomaly.is_none());
            }
            _ => panic!("expected a quantitative envelope"),
        }
        assert!(webhook.sent().is_empty());
        assert!(storage.alerts().is_empty());
    }

    #[tokio::test]
    async fn a_spike_raises_an_alert_and_updates_last_alert_sent() {
        let suite_id = Uuid::new_v4();
        let definition = materialization_definition(suite_id, TestKind::MaterializationRowCount);
        let (executor, storage, webhook) = quant_harness(FixedWarehouse::single_value("ROW_COUNT", 10_000.0));
        storage.seed_definition(TENANT, definition);
        let now = Utc::now();
        let steady: Vec<f64> = (0..40).map(|i| 100.0 + (i % 3) as f64).collect();
        storage.seed_quant_history(TENANT, suite_id, &steady, now);

        let request = ExecuteRequest {
            test_suite_id: suite_id,
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: None,
        };
        let envelope = executor.execute(request, auth()).await.unwrap();

        match envelope {
            ExecutionEnvelope::Quant(result) => {
                assert!(!result.is_warmup);
                let data = result.test_data.expect("non-warmup run always has test data");
                assert!(data.anomaly.is_some());
                assert!(result.alert_data.is_some());
                assert!(result.last_alert_sent.is_some());
            }
            _ => panic!("expected a quantitative envelope"),
        }
        assert_eq!(webhook.sent().len(), 1);
        assert_eq!(storage.alerts().len(), 1);
        assert!(storage.last_alert_sent(TENANT, suite_id).is_some());
    }

    #[tokio::test]
    async fn a_forced_upper_threshold_overrides_the_computed_bound() {
        let suite_id = Uuid::new_v4();
        let mut definition = column_definition(suite_id, TestKind::ColumnNullness);
        definition.custom_upper_threshold = Some(ForcedThreshold {
            value: 1.0,
            mode: ThresholdMode::Absolute,
            source: ThresholdSource::Custom,
        });
        let (executor, storage, webhook) = quant_harness(FixedWarehouse::single_value("NULLNESS_RATE", 0.9));
        storage.seed_definition(TENANT, definition);
        let now = Utc::now();
        let steady: Vec<f64> = (0..40).map(|_| 0.01).collect();
        storage.seed_quant_history(TENANT, suite_id, &steady, now);

        let request = ExecuteRequest {
            test_suite_id: suite_id,
            test_kind: TestKind::ColumnNullness,
            target_org_id: None,
        };
        let envelope = executor.execute(request, auth()).await.unwrap();

        match envelope {
            ExecutionEnvelope::Quant(result) => {
                let data = result.test_data.expect("non-warmup run always has test data");
                assert_eq!(data.expected_upper_bound, 1.0);
                assert!(data.anomaly.is_none(), "0.9 sits under the forced upper bound of 1.0");
            }
            _ => panic!("expected a quantitative envelope"),
        }
        assert!(webhook.sent().is_empty());
        assert!(storage.alerts().is_empty());
    }
}
