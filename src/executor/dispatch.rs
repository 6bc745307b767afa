//! Tenancy resolution and test-kind → SQL dispatch, grounded directly on
//! `execute_test.py::execute`'s four-way organization-id validation.

use uuid::Uuid;

use crate::domain::{TestDefinition, TestKind};
use crate::error::{AppError, AppResult};
use crate::external::AuthClaims;
use crate::query::{column, materialization};

pub struct ExecuteRequest {
    pub test_suite_id: Uuid,
    pub test_kind: TestKind,
    pub target_org_id: Option<Uuid>,
}

/// Exactly one of `target_org_id`/`caller_org_id` must be present;
/// system-internal callers must supply the former, others the latter.
pub fn resolve_organization(request: &ExecuteRequest, auth: &AuthClaims) -> AppResult<Uuid> {
    if auth.is_system_internal && request.target_org_id.is_none() {
        return Err(AppError::unauthorized("target organization id missing"));
    }
    if !auth.is_system_internal && auth.caller_org_id.is_none() {
        return Err(AppError::unauthorized("caller organization id missing"));
    }
    if request.target_org_id.is_none() && auth.caller_org_id.is_none() {
        return Err(AppError::unauthorized("no organization id instance provided"));
    }
    if request.target_org_id.is_some() && auth.caller_org_id.is_some() {
        return Err(AppError::unauthorized(
            "callerOrgId and targetOrgId provided, not allowed",
        ));
    }
    Ok(request
        .target_org_id
        .or(auth.caller_org_id)
        .expect("one of the two is present, checked above"))
}

/// Logs at `warn!` before failing: a missing required field on the
/// definition is expected operator error, not a programmer bug.
pub fn require_field<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| {
        tracing::warn!(field, "test definition missing required field");
        AppError::data_shape(format!("test definition missing required field: {field}"))
    })
}

/// The metric SQL for every built-in quantitative kind. `Custom` and the
/// qualitative kind are handled separately.
pub fn build_metric_sql(def: &TestDefinition) -> AppResult<String> {
    let database = require_field(def.database_name.as_deref(), "databaseName")?;
    let schema = require_field(def.schema_name.as_deref(), "schemaName")?;
    let mat = require_field(def.materialization_name.as_deref(), "materializationName")?;

    match def.test_kind {
        TestKind::MaterializationRowCount => {
            let mat_type = require_field(def.materialization_type, "materializationType")?;
            Ok(materialization::row_count_query(database, schema, mat, mat_type))
        }
        TestKind::MaterializationColumnCount => Ok(materialization::column_count_query(database, schema, mat)),
        TestKind::MaterializationFreshness => {
            let mat_type = require_field(def.materialization_type, "materializationType")?;
            Ok(materialization::freshness_query(database, schema, mat, mat_type))
        }
        TestKind::ColumnCardinality
        | TestKind::ColumnDistribution
        | TestKind::ColumnFreshness
        | TestKind::ColumnNullness
        | TestKind::ColumnUniqueness => {
            let col = require_field(def.column_name.as_deref(), "columnName")?;
            Ok(match def.test_kind {
                TestKind::ColumnCardinality => column::cardinality_query(database, schema, mat, col),
                TestKind::ColumnDistribution => column::distribution_query(database, schema, mat, col),
                TestKind::ColumnFreshness => column::freshness_query(database, schema, mat, col),
                TestKind::ColumnNullness => column::nullness_query(database, schema, mat, col),
                TestKind::ColumnUniqueness => column::uniqueness_query(database, schema, mat, col),
                _ => unreachable!(),
            })
        }
        TestKind::MaterializationSchemaChange | TestKind::Custom => {
            Err(AppError::internal("build_metric_sql called for a non-metric test kind"))
        }
    }
}

pub fn build_schema_sql(def: &TestDefinition) -> AppResult<String> {
    let database = require_field(def.database_name.as_deref(), "databaseName")?;
    let schema = require_field(def.schema_name.as_deref(), "schemaName")?;
    let mat = require_field(def.materialization_name.as_deref(), "materializationName")?;
    Ok(materialization::schema_change_query(database, schema, mat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(is_system_internal: bool, caller_org_id: Option<Uuid>) -> AuthClaims {
        AuthClaims { caller_org_id, is_system_internal }
    }

    #[test]
    fn system_internal_caller_requires_target_org() {
        let request = ExecuteRequest {
            test_suite_id: Uuid::new_v4(),
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: None,
        };
        assert!(resolve_organization(&request, &auth(true, None)).is_err());
    }

    #[test]
    fn both_org_ids_present_is_rejected() {
        let request = ExecuteRequest {
            test_suite_id: Uuid::new_v4(),
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: Some(Uuid::new_v4()),
        };
        assert!(resolve_organization(&request, &auth(false, Some(Uuid::new_v4()))).is_err());
    }

    #[test]
    fn caller_org_id_resolves_for_ordinary_callers() {
        let org = Uuid::new_v4();
        let request = ExecuteRequest {
            test_suite_id: Uuid::new_v4(),
            test_kind: TestKind::MaterializationRowCount,
            target_org_id: None,
        };
        assert_eq!(resolve_organization(&request, &auth(false, Some(org))).unwrap(), org);
    }
}
