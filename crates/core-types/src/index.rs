use crate::enums::SortDirection;
use crate::error::quote_ident;
use serde::{Deserialize, Serialize};

/// The high-write time-series table written by the monitoring pipeline.
pub const EVENTS_TABLE: &str = "events";

/// One column of an index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub direction: SortDirection,
}

impl IndexColumn {
    pub fn asc(name: &str) -> Self {
        Self { name: name.to_string(), direction: SortDirection::Asc }
    }

    pub fn desc(name: &str) -> Self {
        Self { name: name.to_string(), direction: SortDirection::Desc }
    }
}

/// An index the auditor requires to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub target_table: String,
    /// Column order is significant.
    pub columns: Vec<IndexColumn>,
}

impl IndexSpec {
    pub fn new(name: &str, target_table: &str, columns: Vec<IndexColumn>) -> Self {
        Self {
            name: name.to_string(),
            target_table: target_table.to_string(),
            columns,
        }
    }

    /// The create-if-absent statement for this index.
    ///
    /// `concurrently` builds the index without blocking writers; such a statement
    /// must not run inside a transaction block.
    pub fn create_sql(&self, concurrently: bool) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE INDEX {}IF NOT EXISTS {} ON {} ({})",
            if concurrently { "CONCURRENTLY " } else { "" },
            quote_ident(&self.name),
            quote_ident(&self.target_table),
            columns
        )
    }

    /// Drops a leftover of this index (e.g. an invalid one from an aborted build).
    pub fn drop_sql(&self, concurrently: bool) -> String {
        format!(
            "DROP INDEX {}IF EXISTS {}",
            if concurrently { "CONCURRENTLY " } else { "" },
            quote_ident(&self.name)
        )
    }
}

/// The fixed set of indexes the `events` table must carry.
pub fn required_index_specs() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new(
            "idx_events_session_timestamp",
            EVENTS_TABLE,
            vec![IndexColumn::asc("session_id"), IndexColumn::desc("timestamp")],
        ),
        IndexSpec::new("idx_events_session_id", EVENTS_TABLE, vec![IndexColumn::asc("session_id")]),
        IndexSpec::new("idx_events_timestamp", EVENTS_TABLE, vec![IndexColumn::desc("timestamp")]),
    ]
}

/// An index as read from the live catalog. Compared to an `IndexSpec` by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ObservedIndex {
    pub name: String,
    /// `pg_get_indexdef` output; informational.
    pub definition: String,
    /// False for the leftovers of a failed `CREATE INDEX CONCURRENTLY`.
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_specs_cover_the_events_access_paths() {
        let specs = required_index_specs();
        assert_eq!(specs.len(), 3);
        assert!(specs.iter().all(|s| s.target_table == EVENTS_TABLE));
        assert_eq!(
            specs[0].columns,
            vec![IndexColumn::asc("session_id"), IndexColumn::desc("timestamp")]
        );
    }

    #[test]
    fn create_sql_is_conditional_and_keeps_column_order() {
        let spec = &required_index_specs()[0];
        assert_eq!(
            spec.create_sql(true),
            "CREATE INDEX CONCURRENTLY IF NOT EXISTS \"idx_events_session_timestamp\" \
             ON \"events\" (\"session_id\" ASC, \"timestamp\" DESC)"
        );
        assert_eq!(
            spec.create_sql(false),
            "CREATE INDEX IF NOT EXISTS \"idx_events_session_timestamp\" \
             ON \"events\" (\"session_id\" ASC, \"timestamp\" DESC)"
        );
    }

    #[test]
    fn drop_sql_tolerates_absence() {
        let spec = &required_index_specs()[2];
        assert_eq!(spec.drop_sql(true), "DROP INDEX CONCURRENTLY IF EXISTS \"idx_events_timestamp\"");
    }
}
