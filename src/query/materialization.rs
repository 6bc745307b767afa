use super::quote;
use crate::domain::MaterializationType;

/// `select row_count from "{db}".information_schema.tables where
/// table_schema='{s}' and table_name='{m}' limit 1;` for tables, or
/// `select count(*) as row_count from "{db}"."{s}"."{m}";` for views — the
/// information-schema row count is stale for views, so views are counted
/// directly.
pub fn row_count_query(
    database: &str,
    schema: &str,
    materialization: &str,
    materialization_type: MaterializationType,
) -> String {
    match materialization_type {
        MaterializationType::Table => format!(
            "select row_count from {db}.information_schema.tables where table_schema='{schema}' and table_name='{mat}' limit 1;",
            db = quote(database),
            schema = schema,
            mat = materialization,
        ),
        MaterializationType::View => format!(
            "select count(*) as row_count from {db}.{schema}.{mat};",
            db = quote(database),
            schema = quote(schema),
            mat = quote(materialization),
        ),
    }
}

/// `select count(column_name) as column_count from "{db}".information_schema.columns
/// where table_schema='{s}' and table_name='{m}';`
pub fn column_count_query(database: &str, schema: &str, materialization: &str) -> String {
    format!(
        "select count(column_name) as column_count from {db}.information_schema.columns where table_schema='{schema}' and table_name='{mat}';",
        db = quote(database),
        schema = schema,
        mat = materialization,
    )
}

/// Minutes since `last_altered`, converted to UTC and diffed against
/// `sysdate()`, projected as `TIME_DIFF`.
pub fn freshness_query(
    database: &str,
    schema: &str,
    materialization: &str,
    materialization_type: MaterializationType,
) -> String {
    let descriptor = super::mat_type_descriptor(materialization_type);
    format!(
        "select convert_timezone('UTC', last_altered) as last_altered_converted, sysdate() as now, \
         datediff(minute, last_altered_converted, now) as time_diff from {db}.information_schema.{descriptor} \
         where table_schema='{schema}' and table_name='{mat}' limit 1;",
        db = quote(database),
        schema = schema,
        mat = materialization,
    )
}

/// Structural descriptor of every column, ordered by ordinal position and
/// wrapped one JSON object per row via `object_construct(*)`, consumed by
/// the qualitative model to build a `SchemaMap`.
pub fn schema_change_query(database: &str, schema: &str, materialization: &str) -> String {
    format!(
        "with columns as (\
            select column_name, data_type, is_identity, is_nullable, ordinal_position \
            from {db}.information_schema.columns \
            where table_catalog = '{database}' and table_schema = '{schema}' and table_name = '{mat}' \
            order by ordinal_position\
         ) select object_construct(*) as column_definition from columns;",
        db = quote(database),
        database = database,
        schema = schema,
        mat = materialization,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_query_uses_information_schema_for_tables() {
        let sql = row_count_query("DB", "PUBLIC", "ORDERS", MaterializationType::Table);
        assert!(sql.contains("\"DB\".information_schema.tables"));
        assert!(sql.contains("table_schema='PUBLIC'"));
        assert!(sql.contains("table_name='ORDERS'"));
    }

    #[test]
    fn row_count_query_counts_views_directly() {
        let sql = row_count_query("DB", "PUBLIC", "ORDERS_VIEW", MaterializationType::View);
        assert!(sql.contains("\"DB\".\"PUBLIC\".\"ORDERS_VIEW\""));
        assert!(sql.starts_with("select count(*) as row_count"));
    }

    #[test]
    fn schema_change_query_quotes_database_identifier() {
        let sql = schema_change_query("DB", "PUBLIC", "ORDERS");
        assert!(sql.contains("\"DB\".information_schema.columns"));
        assert!(sql.contains("object_construct(*) as column_definition"));
    }
}
