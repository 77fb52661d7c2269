use core_types::RepairReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("Every repair step failed ({} of {})", .0.failed(), .0.steps.len())]
    AggregateFailure(Box<RepairReport>),
}
