use crate::error::DbError;
use async_trait::async_trait;
use core_types::{ObservedIndex, TableStats};

/// The catalog reads and schema statements the auditor and repairer need.
///
/// `DbRepository` is the live implementation. Keeping this behind a trait lets the
/// step logic (ordering, failure isolation, reporting) be exercised without a server.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Indexes defined on `table` in the current schema.
    async fn list_indexes(&self, table: &str) -> Result<Vec<ObservedIndex>, DbError>;

    /// Runs one statement outside any explicit transaction and returns the rows affected.
    async fn execute(&self, sql: &str) -> Result<u64, DbError>;

    /// Runs all statements in a single transaction; any failure rolls every one back.
    async fn execute_in_transaction(&self, statements: &[String]) -> Result<u64, DbError>;

    /// Runs a query returning a single `bigint`.
    async fn count(&self, sql: &str) -> Result<i64, DbError>;

    /// Size and row count of `table`.
    async fn table_stats(&self, table: &str, exact_row_count: bool) -> Result<TableStats, DbError>;
}
