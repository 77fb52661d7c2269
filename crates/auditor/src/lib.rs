//! Keeps the high-write `events` table carrying its required indexes.
//!
//! An audit reads the catalog, builds whatever required index is missing (each
//! build independent of the others), refreshes planner statistics, re-reads the
//! catalog to confirm, and reports table size and row count.

use configuration::AuditSettings;
use core_types::{
    AuditReport, IndexOutcome, IndexSpec, IndexStatus, ObservedIndex, quote_ident,
    required_index_specs, validate_identifier,
};
use database::{DbError, SchemaStore};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;

pub mod error;

pub use error::AuditError;

/// What the audit has to do for one required index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    /// Present and valid; nothing to issue.
    Keep,
    Create,
    /// Present but invalid (an aborted concurrent build); drop, then create.
    Rebuild,
}

/// Compares required specs to the observed catalog, by name only.
pub fn plan_audit(required: &[IndexSpec], observed: &[ObservedIndex]) -> Vec<(IndexSpec, PlannedAction)> {
    let observed: HashMap<&str, &ObservedIndex> =
        observed.iter().map(|o| (o.name.as_str(), o)).collect();

    required
        .iter()
        .map(|spec| {
            let action = match observed.get(spec.name.as_str()) {
                Some(index) if index.is_valid => PlannedAction::Keep,
                Some(_) => PlannedAction::Rebuild,
                None => PlannedAction::Create,
            };
            (spec.clone(), action)
        })
        .collect()
}

/// Required names that are absent or invalid in `observed`.
pub fn missing_names(required: &[IndexSpec], observed: &[ObservedIndex]) -> Vec<String> {
    plan_audit(required, observed)
        .into_iter()
        .filter(|(_, action)| *action != PlannedAction::Keep)
        .map(|(spec, _)| spec.name)
        .collect()
}

pub struct IndexAuditor<'a, S: SchemaStore + ?Sized> {
    store: &'a S,
    settings: &'a AuditSettings,
    /// Upper bound on simultaneous non-concurrent builds; should not exceed the pool size.
    max_parallel: usize,
}

impl<'a, S: SchemaStore + ?Sized> IndexAuditor<'a, S> {
    pub fn new(store: &'a S, settings: &'a AuditSettings, max_parallel: usize) -> Self {
        Self {
            store,
            settings,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Audits `table` against the required index set.
    ///
    /// Individual build failures are recorded in the report and never stop the
    /// remaining builds. Pool and connection failures abort the audit.
    pub async fn audit(&self, table: &str) -> Result<AuditReport, AuditError> {
        validate_identifier(table)?;

        let required: Vec<IndexSpec> = required_index_specs()
            .into_iter()
            .filter(|spec| spec.target_table == table)
            .collect();

        // 1. Observe
        let observed = self.store.list_indexes(table).await?;
        tracing::info!(
            table,
            required = required.len(),
            observed = observed.len(),
            "Read index catalog."
        );

        // 2. Plan and build, bounded by the pool size.
        let plan = plan_audit(&required, &observed);
        let results: Vec<(String, Result<IndexStatus, DbError>)> = stream::iter(plan)
            .map(|(spec, action)| async move {
                let status = self.apply(&spec, action).await;
                (spec.name, status)
            })
            .buffered(self.build_parallelism())
            .collect()
            .await;

        let mut report = AuditReport {
            table: table.to_string(),
            ..Default::default()
        };
        for (name, result) in results {
            let status = match result {
                Ok(status) => status,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::error!(index = %name, error = %e, "Index creation failed; continuing.");
                    IndexStatus::Failed(e.detail())
                }
            };
            report.outcomes.push(IndexOutcome { name, status });
        }

        // 3. Refresh planner statistics, even when nothing was built.
        match self.store.execute(&format!("ANALYZE {}", quote_ident(table))).await {
            Ok(_) => report.analyzed = true,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(table, error = %e, "ANALYZE failed.");
                report.analyze_error = Some(e.detail());
            }
        }

        // 4. Confirm against the catalog and collect statistics.
        let observed_after = self.store.list_indexes(table).await?;
        report.still_missing = missing_names(&required, &observed_after);
        report.stats = self
            .store
            .table_stats(table, self.settings.exact_row_count)
            .await?;

        if report.attempted() > 0
            && report.created() == 0
            && report.stats.row_count >= self.settings.non_trivial_rows
        {
            return Err(AuditError::AggregateFailure(Box::new(report)));
        }

        tracing::info!(
            table,
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Audit finished."
        );
        Ok(report)
    }

    /// How many index builds may run at once.
    ///
    /// PostgreSQL runs one `CREATE INDEX CONCURRENTLY` per table at a time; parallel
    /// concurrent builds on the same table deadlock each other.
    pub fn build_parallelism(&self) -> usize {
        if self.settings.concurrent_builds {
            1
        } else {
            self.max_parallel.max(1)
        }
    }

    async fn apply(&self, spec: &IndexSpec, action: PlannedAction) -> Result<IndexStatus, DbError> {
        let concurrently = self.settings.concurrent_builds;
        match action {
            PlannedAction::Keep => {
                tracing::debug!(index = %spec.name, "Index present.");
                Ok(IndexStatus::Present)
            }
            PlannedAction::Create => {
                tracing::info!(index = %spec.name, "Creating missing index.");
                self.store.execute(&spec.create_sql(concurrently)).await?;
                Ok(IndexStatus::Created)
            }
            PlannedAction::Rebuild => {
                tracing::warn!(index = %spec.name, "Index is invalid; rebuilding.");
                self.store.execute(&spec.drop_sql(concurrently)).await?;
                self.store.execute(&spec.create_sql(concurrently)).await?;
                Ok(IndexStatus::Rebuilt)
            }
        }
    }
}
