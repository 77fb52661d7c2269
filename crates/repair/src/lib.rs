//! One-shot corrective migrations for an already-evolved monitoring schema.
//!
//! Steps run sequentially in [`RepairStep::ORDERED`]. Each is idempotent and has
//! its own precondition, so a failing step is logged and recorded and the next
//! one still runs. Only pool/connection failures abort the run.

use core_types::{RepairReport, RepairStep, StepOutcome, StepReport};
use database::{DbError, SchemaStore};
use thiserror::Error;

pub mod error;
pub mod statements;

pub use error::RepairError;

pub struct SchemaRepairer<'a, S: SchemaStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SchemaStore + ?Sized> SchemaRepairer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Applies every step and reports each outcome.
    pub async fn apply_fixes(&self) -> Result<RepairReport, RepairError> {
        let mut report = RepairReport::default();

        for step in RepairStep::ORDERED {
            tracing::info!(step = step.name(), "Applying repair step.");
            let outcome = match self.apply(step).await {
                Ok(rows_affected) => {
                    tracing::info!(step = step.name(), rows_affected, "Repair step applied.");
                    StepOutcome::Applied { rows_affected }
                }
                Err(StepFailure::Database(e)) if e.is_fatal() => return Err(e.into()),
                Err(failure) => {
                    tracing::error!(step = step.name(), error = %failure, "Repair step failed; continuing.");
                    StepOutcome::Failed(failure.detail())
                }
            };
            report.steps.push(StepReport { step, outcome });
        }

        if report.applied() == 0 {
            return Err(RepairError::AggregateFailure(Box::new(report)));
        }
        Ok(report)
    }

    async fn apply(&self, step: RepairStep) -> Result<u64, StepFailure> {
        if step == RepairStep::NormalizeAlertStatus {
            let violations = self.store.count(&statements::alert_status_violations_sql()).await?;
            if violations > 0 {
                return Err(StepFailure::Precondition(format!(
                    "{} alert rows carry a status outside {:?}; constraint left unchanged",
                    violations,
                    statements::ALERT_STATUSES
                )));
            }
        }

        let sql = statements::statements(step);
        let (atomic, sequential) = sql.split_at(statements::transactional_prefix(step));
        let mut rows_affected = 0;
        if !atomic.is_empty() {
            rows_affected += self.store.execute_in_transaction(atomic).await?;
        }
        for statement in sequential {
            rows_affected += self.store.execute(statement).await?;
        }
        Ok(rows_affected)
    }
}

/// Why a single step did not apply.
#[derive(Error, Debug)]
enum StepFailure {
    #[error(transparent)]
    Database(#[from] DbError),

    /// The step refused to run because existing data would make it fail.
    #[error("{0}")]
    Precondition(String),
}

impl StepFailure {
    fn detail(&self) -> String {
        match self {
            StepFailure::Database(e) => e.detail(),
            StepFailure::Precondition(msg) => msg.clone(),
        }
    }
}
