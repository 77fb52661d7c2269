use crate::enums::RepairStep;
use serde::{Deserialize, Serialize};

/// Size and cardinality of a table, as reported after an audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TableStats {
    pub total_bytes: i64,
    pub table_bytes: i64,
    pub index_bytes: i64,
    pub total_size: String,
    pub table_size: String,
    pub index_size: String,
    /// Planner estimate unless an exact count was requested.
    pub row_count: i64,
    pub row_count_exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStatus {
    /// Already existed; nothing issued.
    Present,
    Created,
    /// An invalid leftover was dropped and the index built again.
    Rebuilt,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOutcome {
    pub name: String,
    pub status: IndexStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub table: String,
    pub outcomes: Vec<IndexOutcome>,
    pub analyzed: bool,
    pub analyze_error: Option<String>,
    /// Required indexes absent (or invalid) when the catalog was re-read.
    pub still_missing: Vec<String>,
    pub stats: TableStats,
}

impl AuditReport {
    fn count(&self, pred: impl Fn(&IndexStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, IndexStatus::Created | IndexStatus::Rebuilt))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, IndexStatus::Present))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, IndexStatus::Failed(_)))
    }

    /// Number of required indexes that needed a create statement this run.
    pub fn attempted(&self) -> usize {
        self.outcomes.len() - self.skipped()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Applied { rows_affected: u64 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: RepairStep,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairReport {
    pub steps: Vec<StepReport>,
}

impl RepairReport {
    pub fn applied(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Applied { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.applied()
    }

    pub fn outcome_of(&self, step: RepairStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.outcome)
    }
}
