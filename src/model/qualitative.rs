//! Structural schema diffing, grounded directly on
//! `SchemaChangeModel.run`: walk both schemas by 1-based ordinal position,
//! record a deviation for every position where a column was added,
//! removed, or any of its attributes changed.

use crate::domain::{ColumnDef, SchemaDiff, SchemaMap};

pub struct QualitativeOutcome {
    pub is_identical: bool,
    pub deviations: Vec<SchemaDiff>,
}

/// `old` is `None` on a suite's first-ever run: there is nothing to diff
/// against, so the new schema is trivially identical to "no schema".
pub fn diff_schema(old: Option<&SchemaMap>, new: &SchemaMap) -> QualitativeOutcome {
    let Some(old) = old else {
        return QualitativeOutcome {
            is_identical: true,
            deviations: Vec::new(),
        };
    };

    let old_count = old.len() as u32;
    let new_count = new.len() as u32;
    let max_position = old_count.max(new_count);

    let mut deviations = Vec::new();
    for position in 1..=max_position {
        let key = position.to_string();
        let old_col = (position <= old_count).then(|| old.get(&key)).flatten();
        let new_col = (position <= new_count).then(|| new.get(&key)).flatten();

        match (old_col, new_col) {
            (Some(old_col), None) => deviations.push(removed(old_col)),
            (None, Some(new_col)) => deviations.push(added(new_col)),
            (Some(old_col), Some(new_col)) => {
                if let Some(diff) = compare(old_col, new_col) {
                    deviations.push(diff);
                }
            }
            (None, None) => {}
        }
    }

    QualitativeOutcome {
        is_identical: deviations.is_empty(),
        deviations,
    }
}

fn removed(col: &ColumnDef) -> SchemaDiff {
    SchemaDiff {
        column_name: (Some(col.column_name.clone()), None),
        ordinal_position: (Some(col.ordinal_position), None),
        data_type: Some((Some(col.data_type.clone()), None)),
        is_identity: Some((Some(col.is_identity), None)),
        is_nullable: Some((Some(col.is_nullable), None)),
    }
}

fn added(col: &ColumnDef) -> SchemaDiff {
    SchemaDiff {
        column_name: (None, Some(col.column_name.clone())),
        ordinal_position: (None, Some(col.ordinal_position)),
        data_type: Some((None, Some(col.data_type.clone()))),
        is_identity: Some((None, Some(col.is_identity))),
        is_nullable: Some((None, Some(col.is_nullable))),
    }
}

/// `None` when every attribute matches. `column_name`/`ordinal_position`
/// are always populated on a diff regardless of which attribute actually
/// changed; `data_type`/`is_identity`/`is_nullable` are populated only
/// when that specific attribute differs.
fn compare(old: &ColumnDef, new: &ColumnDef) -> Option<SchemaDiff> {
    let name_same = old.column_name == new.column_name;
    let type_same = old.data_type == new.data_type;
    let position_same = old.ordinal_position == new.ordinal_position;
    let identity_same = old.is_identity == new.is_identity;
    let nullable_same = old.is_nullable == new.is_nullable;

    if name_same && type_same && position_same && identity_same && nullable_same {
        return None;
    }

    Some(SchemaDiff {
        column_name: (Some(old.column_name.clone()), Some(new.column_name.clone())),
        ordinal_position: (Some(old.ordinal_position), Some(new.ordinal_position)),
        data_type: (!type_same).then(|| (Some(old.data_type.clone()), Some(new.data_type.clone()))),
        is_identity: (!identity_same).then_some((Some(old.is_identity), Some(new.is_identity))),
        is_nullable: (!nullable_same).then_some((Some(old.is_nullable), Some(new.is_nullable))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, position: u32, data_type: &str) -> ColumnDef {
        ColumnDef {
            column_name: name.to_string(),
            data_type: data_type.to_string(),
            is_identity: false,
            is_nullable: true,
            ordinal_position: position,
        }
    }

    #[test]
    fn first_run_has_no_old_schema_and_is_identical() {
        let mut new = SchemaMap::new();
        new.insert("1".into(), col("id", 1, "integer"));
        let outcome = diff_schema(None, &new);
        assert!(outcome.is_identical);
        assert!(outcome.deviations.is_empty());
    }

    #[test]
    fn identical_schemas_produce_no_deviations() {
        let mut schema = SchemaMap::new();
        schema.insert("1".into(), col("id", 1, "integer"));
        schema.insert("2".into(), col("email", 2, "varchar"));
        let outcome = diff_schema(Some(&schema), &schema);
        assert!(outcome.is_identical);
    }

    #[test]
    fn dropped_trailing_column_is_a_removal_diff() {
        let mut old = SchemaMap::new();
        old.insert("1".into(), col("id", 1, "integer"));
        old.insert("2".into(), col("email", 2, "varchar"));
        let mut new = SchemaMap::new();
        new.insert("1".into(), col("id", 1, "integer"));

        let outcome = diff_schema(Some(&old), &new);
        assert!(!outcome.is_identical);
        assert_eq!(outcome.deviations.len(), 1);
        assert_eq!(outcome.deviations[0].column_name, (Some("email".into()), None));
    }

    #[test]
    fn type_change_only_populates_data_type_tuple() {
        let mut old = SchemaMap::new();
        old.insert("1".into(), col("amount", 1, "integer"));
        let mut new = SchemaMap::new();
        new.insert("1".into(), col("amount", 1, "numeric"));

        let outcome = diff_schema(Some(&old), &new);
        assert_eq!(outcome.deviations.len(), 1);
        let diff = &outcome.deviations[0];
        assert_eq!(diff.data_type, Some((Some("integer".into()), Some("numeric".into()))));
        assert!(diff.is_identity.is_none());
        assert!(diff.is_nullable.is_none());
        assert_eq!(diff.column_name, (Some("amount".into()), Some("amount".into())));
    }
}
