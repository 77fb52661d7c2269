//! Human-readable summaries printed at the end of a run.

use comfy_table::{Table, presets::UTF8_FULL};
use core_types::{AuditReport, IndexStatus, RepairReport, StepOutcome};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

/// Renders an audit: one row per required index, then counts and table statistics.
pub fn render_audit(report: &AuditReport) -> String {
    let mut table = new_table(vec!["Index", "Status", "Detail"]);
    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.status {
            IndexStatus::Present => ("skipped", "already present"),
            IndexStatus::Created => ("created", ""),
            IndexStatus::Rebuilt => ("created", "invalid index rebuilt"),
            IndexStatus::Failed(msg) => ("FAILED", msg.as_str()),
        };
        table.add_row(vec![outcome.name.as_str(), status, detail]);
    }
    table.add_row(vec![
        "ANALYZE",
        if report.analyzed { "done" } else { "FAILED" },
        report.analyze_error.as_deref().unwrap_or(""),
    ]);

    let stats = &report.stats;
    let mut out = format!("{table}\n");
    out.push_str(&format!(
        "Indexes on '{}': {} created, {} skipped, {} failed\n",
        report.table,
        report.created(),
        report.skipped(),
        report.failed()
    ));
    if !report.still_missing.is_empty() {
        out.push_str(&format!("Still missing: {}\n", report.still_missing.join(", ")));
    }
    out.push_str(&format!(
        "Table size: {} total ({} data, {} indexes), {} rows{}\n",
        stats.total_size,
        stats.table_size,
        stats.index_size,
        stats.row_count,
        if stats.row_count_exact { "" } else { " (estimated)" }
    ));
    out
}

/// Renders a repair run: one row per step in execution order, then counts.
pub fn render_repair(report: &RepairReport) -> String {
    let mut table = new_table(vec!["Step", "Status", "Detail"]);
    for step in &report.steps {
        let (status, detail) = match &step.outcome {
            StepOutcome::Applied { rows_affected } => {
                ("applied", format!("{} ({} rows)", step.step.description(), rows_affected))
            }
            StepOutcome::Failed(msg) => ("FAILED", msg.clone()),
        };
        table.add_row(vec![step.step.name().to_string(), status.to_string(), detail]);
    }

    format!(
        "{table}\nRepair steps: {} applied, {} failed\n",
        report.applied(),
        report.failed()
    )
}
