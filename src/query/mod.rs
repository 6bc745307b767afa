//! Pure SQL builders for the warehouse's data-dictionary and metric
//! queries. No state, no I/O — each function returns the exact string the
//! `Warehouse` collaborator is asked to run. Identifiers are always
//! double-quoted to preserve case and defuse reserved-word collisions.

pub mod column;
pub mod materialization;

use crate::domain::MaterializationType;

pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

pub(crate) fn mat_type_descriptor(kind: MaterializationType) -> &'static str {
    match kind {
        MaterializationType::Table => "Tables",
        MaterializationType::View => "Views",
    }
}
