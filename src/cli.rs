use clap::{Parser, ValueEnum};
use uuid::Uuid;

use crate::domain::TestKind;

/// One execution per invocation: the engine is a CLI, not a long-running
/// service.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "test-execution-engine",
    version,
    about = "Runs one data-quality test and prints its result envelope as JSON"
)]
pub struct Args {
    #[arg(long)]
    pub test_suite_id: Uuid,

    #[arg(long, value_enum)]
    pub test_type: TestKindArg,

    /// Present for system-internal callers; mutually exclusive with `--caller-org-id`.
    #[arg(long)]
    pub target_org_id: Option<Uuid>,

    /// Present for ordinary callers; mutually exclusive with `--target-org-id`.
    #[arg(long)]
    pub caller_org_id: Option<Uuid>,

    #[arg(long, default_value_t = false)]
    pub system_internal: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[value(rename_all = "PascalCase")]
pub enum TestKindArg {
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

impl From<TestKindArg> for TestKind {
    fn from(value: TestKindArg) -> Self {
        match value {
            TestKindArg::MaterializationRowCount => TestKind::MaterializationRowCount,
            TestKindArg::MaterializationColumnCount => TestKind::MaterializationColumnCount,
            TestKindArg::MaterializationFreshness => TestKind::MaterializationFreshness,
            TestKindArg::ColumnCardinality => TestKind::ColumnCardinality,
            TestKindArg::ColumnDistribution => TestKind::ColumnDistribution,
            TestKindArg::ColumnFreshness => TestKind::ColumnFreshness,
            TestKindArg::ColumnNullness => TestKind::ColumnNullness,
            TestKindArg::ColumnUniqueness => TestKind::ColumnUniqueness,
            TestKindArg::MaterializationSchemaChange => TestKind::MaterializationSchemaChange,
            TestKindArg::Custom => TestKind::Custom,
        }
    }
}
