//! The SQL behind each repair step. Every statement is safe to re-run.

use core_types::RepairStep;

pub const ALERTS_TABLE: &str = "alerts";
pub const ALERT_STATUS_CONSTRAINT: &str = "alerts_status_check";
pub const ALERT_STATUSES: [&str; 4] = ["pending", "new", "acknowledged", "resolved"];

pub const TRIGGER_WORDS_TABLE: &str = "trigger_words";
pub const TRIGGER_WORD_UNIQUE_INDEX: &str = "trigger_words_word_case_unique";

pub const ANTI_BLOCKING_TABLE: &str = "anti_blocking_settings";
pub const ANTI_BLOCKING_SINGLETON_ID: i32 = 1;

fn status_list() -> String {
    ALERT_STATUSES
        .iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Counts alerts the canonical constraint would reject. Zero is required before it is (re)added.
pub fn alert_status_violations_sql() -> String {
    format!(
        "SELECT COUNT(*) FROM {ALERTS_TABLE} WHERE status IS NOT NULL AND status NOT IN ({})",
        status_list()
    )
}

/// The statements of a step, executed in order.
pub fn statements(step: RepairStep) -> Vec<String> {
    match step {
        // Drop and add run in one transaction; check bodies cannot be altered in place.
        // NOT VALID keeps the ACCESS EXCLUSIVE lock to a catalog update. The scan of
        // existing rows happens afterwards under VALIDATE, which lets writes through.
        RepairStep::NormalizeAlertStatus => vec![
            format!("ALTER TABLE {ALERTS_TABLE} DROP CONSTRAINT IF EXISTS {ALERT_STATUS_CONSTRAINT}"),
            format!(
                "ALTER TABLE {ALERTS_TABLE} ADD CONSTRAINT {ALERT_STATUS_CONSTRAINT} \
                 CHECK (status IN ({})) NOT VALID",
                status_list()
            ),
            format!("ALTER TABLE {ALERTS_TABLE} VALIDATE CONSTRAINT {ALERT_STATUS_CONSTRAINT}"),
        ],
        // One set-based statement: keeps the lowest id per key, no row-by-row scan.
        RepairStep::DeduplicateTriggerWords => vec![format!(
            "DELETE FROM {TRIGGER_WORDS_TABLE} WHERE id NOT IN (\
             SELECT MIN(id) FROM {TRIGGER_WORDS_TABLE} GROUP BY lower(word), case_sensitive)"
        )],
        // Not CONCURRENTLY: a failed concurrent build leaves an invalid index that
        // IF NOT EXISTS would then accept as done.
        RepairStep::EnforceTriggerWordUniqueness => vec![format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {TRIGGER_WORD_UNIQUE_INDEX} \
             ON {TRIGGER_WORDS_TABLE} (lower(word), case_sensitive)"
        )],
        RepairStep::BackfillAntiBlockingSettings => vec![format!(
            "INSERT INTO {ANTI_BLOCKING_TABLE} (id, settings) \
             VALUES ({ANTI_BLOCKING_SINGLETON_ID}, '{{}}'::jsonb) ON CONFLICT (id) DO NOTHING"
        )],
    }
}

/// How many leading statements of a step must succeed or fail together.
/// The rest run one at a time after that transaction commits.
pub fn transactional_prefix(step: RepairStep) -> usize {
    match step {
        RepairStep::NormalizeAlertStatus => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_is_dropped_before_it_is_added() {
        let sql = statements(RepairStep::NormalizeAlertStatus);
        assert_eq!(sql.len(), 3);
        assert!(sql[0].contains("DROP CONSTRAINT IF EXISTS alerts_status_check"));
        assert!(sql[1].ends_with("CHECK (status IN ('pending', 'new', 'acknowledged', 'resolved')) NOT VALID"));
        assert_eq!(transactional_prefix(RepairStep::NormalizeAlertStatus), 2);
    }

    #[test]
    fn existing_rows_are_validated_outside_the_swap() {
        let sql = statements(RepairStep::NormalizeAlertStatus);
        let (swap, rest) = sql.split_at(transactional_prefix(RepairStep::NormalizeAlertStatus));
        assert!(swap.iter().all(|s| !s.contains("VALIDATE")));
        assert_eq!(rest, ["ALTER TABLE alerts VALIDATE CONSTRAINT alerts_status_check"]);
    }

    #[test]
    fn other_steps_are_not_transactional() {
        for step in RepairStep::ORDERED {
            if step != RepairStep::NormalizeAlertStatus {
                assert_eq!(transactional_prefix(step), 0, "{}", step.name());
            }
        }
    }

    #[test]
    fn dedupe_is_a_single_set_based_delete() {
        let sql = statements(RepairStep::DeduplicateTriggerWords);
        assert_eq!(sql.len(), 1);
        assert_eq!(
            sql[0],
            "DELETE FROM trigger_words WHERE id NOT IN (SELECT MIN(id) FROM trigger_words \
             GROUP BY lower(word), case_sensitive)"
        );
    }

    #[test]
    fn backfill_never_overwrites() {
        let sql = statements(RepairStep::BackfillAntiBlockingSettings);
        assert_eq!(
            sql[0],
            "INSERT INTO anti_blocking_settings (id, settings) VALUES (1, '{}'::jsonb) \
             ON CONFLICT (id) DO NOTHING"
        );
    }

    #[test]
    fn unique_index_is_conditional() {
        let sql = statements(RepairStep::EnforceTriggerWordUniqueness);
        assert!(sql[0].starts_with("CREATE UNIQUE INDEX IF NOT EXISTS trigger_words_word_case_unique"));
    }
}
