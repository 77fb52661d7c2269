use core_types::AuditReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Invalid audit target: {0}")]
    InvalidTarget(#[from] core_types::CoreError),

    /// The run left the table worse off than a no-op would have: indexes were
    /// missing, none could be built, and the table is large enough to matter.
    #[error(
        "No missing index on '{}' could be created ({} attempted, {} rows)",
        .0.table, .0.attempted(), .0.stats.row_count
    )]
    AggregateFailure(Box<AuditReport>),
}
