use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// The keyword used in an index column list.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// The corrective steps applied by `vigil repair`, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepairStep {
    NormalizeAlertStatus,
    DeduplicateTriggerWords,
    EnforceTriggerWordUniqueness,
    BackfillAntiBlockingSettings,
}

impl RepairStep {
    pub const ORDERED: [RepairStep; 4] = [
        RepairStep::NormalizeAlertStatus,
        RepairStep::DeduplicateTriggerWords,
        RepairStep::EnforceTriggerWordUniqueness,
        RepairStep::BackfillAntiBlockingSettings,
    ];

    /// Short, stable name used in logs and the summary table.
    pub fn name(&self) -> &'static str {
        match self {
            RepairStep::NormalizeAlertStatus => "normalize-alert-status",
            RepairStep::DeduplicateTriggerWords => "dedupe-trigger-words",
            RepairStep::EnforceTriggerWordUniqueness => "unique-trigger-words",
            RepairStep::BackfillAntiBlockingSettings => "backfill-anti-blocking",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RepairStep::NormalizeAlertStatus => "Replace the alerts.status check constraint",
            RepairStep::DeduplicateTriggerWords => "Delete later duplicates of (lower(word), case_sensitive)",
            RepairStep::EnforceTriggerWordUniqueness => "Unique index on (lower(word), case_sensitive)",
            RepairStep::BackfillAntiBlockingSettings => "Ensure the id=1 anti-blocking settings row",
        }
    }
}
