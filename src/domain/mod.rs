pub mod execution;
pub mod test_definition;

pub use execution::*;
pub use test_definition::*;
