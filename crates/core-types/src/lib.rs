pub mod enums;
pub mod error;
pub mod index;
pub mod report;

// Re-export the core types to provide a clean public API.
pub use enums::{RepairStep, SortDirection};
pub use error::{CoreError, quote_ident, validate_identifier};
pub use index::{IndexColumn, IndexSpec, ObservedIndex, EVENTS_TABLE, required_index_specs};
pub use report::{
    AuditReport, IndexOutcome, IndexStatus, RepairReport, StepOutcome, StepReport, TableStats,
};
