use super::quote;

/// `select count(distinct("{c}")) as distinct_value_count from "{db}"."{s}"."{m}";`
pub fn cardinality_query(
    database: &str,
    schema: &str,
    materialization: &str,
    column: &str,
) -> String {
    format!(
        "select count(distinct({col})) as distinct_value_count from {db}.{schema}.{mat};",
        db = quote(database),
        schema = quote(schema),
        mat = quote(materialization),
        col = quote(column),
    )
}

/// Median plus auxiliary mean/quartiles; only `MEDIAN` is consumed by the
/// engine, the rest exists for downstream diagnostics.
pub fn distribution_query(
    database: &str,
    schema: &str,
    materialization: &str,
    column: &str,
) -> String {
    format!(
        "select median({col}) as median, avg({col}) as mean, \
         percentile_cont(0.25) within group (order by {col}) as q1, \
         percentile_cont(0.75) within group (order by {col}) as q3 \
         from {db}.{schema}.{mat};",
        db = quote(database),
        schema = quote(schema),
        mat = quote(materialization),
        col = quote(column),
    )
}

/// Minutes since the column's own freshness marker. Picks the latest row
/// by ordering on the column itself, nulls last, rather than aggregating —
/// an aggregate can't coexist with an `order by` on the raw column.
pub fn freshness_query(
    database: &str,
    schema: &str,
    materialization: &str,
    column: &str,
) -> String {
    format!(
        "select convert_timezone('UTC', {col}) as last_value_converted, sysdate() as now, \
         datediff(minute, last_value_converted, now) as time_diff \
         from {db}.{schema}.{mat} order by {col} desc nulls last limit 1;",
        db = quote(database),
        schema = quote(schema),
        mat = quote(materialization),
        col = quote(column),
    )
}

/// `null_value_count / (null_value_count + non_null_value_count) as nullness_rate`,
/// guarded against a zero denominator on an empty materialization.
pub fn nullness_query(
    database: &str,
    schema: &str,
    materialization: &str,
    column: &str,
) -> String {
    format!(
        "with counts as (\
            select count_if({col} is null) as null_value_count, \
                   count_if({col} is not null) as non_null_value_count \
            from {db}.{schema}.{mat}\
         ) select iff(null_value_count + non_null_value_count = 0, 0, \
                      null_value_count / (null_value_count + non_null_value_count)) as nullness_rate \
           from counts;",
        db = quote(database),
        schema = quote(schema),
        mat = quote(materialization),
        col = quote(column),
    )
}

/// `distinct_value_count/non_null_value_count as uniqueness_rate`, guarded
/// against a zero denominator on a fully-null column.
pub fn uniqueness_query(
    database: &str,
    schema: &str,
    materialization: &str,
    column: &str,
) -> String {
    format!(
        "with counts as (\
            select count(distinct({col})) as distinct_value_count, \
                   count_if({col} is not null) as non_null_value_count \
            from {db}.{schema}.{mat}\
         ) select iff(non_null_value_count = 0, 0, \
                      distinct_value_count / non_null_value_count) as uniqueness_rate \
           from counts;",
        db = quote(database),
        schema = quote(schema),
        mat = quote(materialization),
        col = quote(column),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_query_quotes_every_identifier() {
        let sql = cardinality_query("DB", "PUBLIC", "EVENTS", "USER_ID");
        assert!(sql.contains("\"DB\".\"PUBLIC\".\"EVENTS\""));
        assert!(sql.contains("distinct(\"USER_ID\")"));
    }

    #[test]
    fn nullness_query_computes_rate_from_counts_cte() {
        let sql = nullness_query("DB", "PUBLIC", "EVENTS", "EMAIL");
        assert!(sql.contains("null_value_count / (null_value_count + non_null_value_count)"));
    }
}
