//! Alert message templates, grounded directly on
//! `execute_test.py::getAnomalyMessage`.

use crate::domain::TestKind;

pub struct TargetContext<'a> {
    pub target_resource_id: &'a str,
    pub database_name: &'a str,
    pub schema_name: &'a str,
    pub materialization_name: &'a str,
    pub column_name: Option<&'a str>,
}

fn target_link(ctx: &TargetContext) -> String {
    let suffix = ctx.column_name.map(|c| format!(".{c}")).unwrap_or_default();
    format!(
        "<__base_url__?targetResourceId={}&ampisColumn={}|{}.{}.{}{}>",
        ctx.target_resource_id,
        ctx.column_name.is_some(),
        ctx.database_name,
        ctx.schema_name,
        ctx.materialization_name,
        suffix,
    )
}

/// Built-in quantitative and qualitative kinds share one link format,
/// varying only the subject phrase. `Custom` has no built-in target, so
/// it goes through `custom_metric_message` instead.
pub fn anomaly_message(kind: TestKind, ctx: &TargetContext) -> String {
    let subject = match kind {
        TestKind::ColumnFreshness => "Freshness deviation for column",
        TestKind::ColumnDistribution => "Distribution deviation for column",
        TestKind::ColumnCardinality => "Cardinality deviation for column",
        TestKind::ColumnNullness => "Nullness deviation for column",
        TestKind::ColumnUniqueness => "Uniqueness deviation for column",
        TestKind::MaterializationColumnCount => "Column count deviation for materialization",
        TestKind::MaterializationRowCount => "Row count deviation for materialization",
        TestKind::MaterializationFreshness => "Freshness deviation for materialization",
        TestKind::MaterializationSchemaChange => "Schema change for materialization",
        TestKind::Custom => "Deviation detected",
    };
    format!("{subject} {} detected", target_link(ctx))
}

pub fn custom_metric_message(metric_name: &str) -> String {
    format!("<__base_url__?metric={metric_name}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_kind_embeds_column_name_in_link() {
        let ctx = TargetContext {
            target_resource_id: "res-1",
            database_name: "DB",
            schema_name: "PUBLIC",
            materialization_name: "ORDERS",
            column_name: Some("AMOUNT"),
        };
        let message = anomaly_message(TestKind::ColumnNullness, &ctx);
        assert!(message.starts_with("Nullness deviation for column"));
        assert!(message.contains("isColumn=true"));
        assert!(message.contains("DB.PUBLIC.ORDERS.AMOUNT"));
    }

    #[test]
    fn materialization_kind_has_no_column_suffix() {
        let ctx = TargetContext {
            target_resource_id: "res-2",
            database_name: "DB",
            schema_name: "PUBLIC",
            materialization_name: "ORDERS",
            column_name: None,
        };
        let message = anomaly_message(TestKind::MaterializationRowCount, &ctx);
        assert!(message.contains("isColumn=false"));
        assert!(message.contains("DB.PUBLIC.ORDERS>"));
    }

    #[test]
    fn custom_message_carries_metric_name_only() {
        assert_eq!(custom_metric_message("signup_rate"), "<__base_url__?metric=signup_rate>");
    }
}
