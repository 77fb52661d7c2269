use crate::error::DbError;
use crate::store::SchemaStore;
use async_trait::async_trait;
use core_types::{ObservedIndex, TableStats, quote_ident, validate_identifier};
use sqlx::Executor;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, Postgres};

const LIST_INDEXES_SQL: &str = r#"
    SELECT
        i.relname::text AS name,
        pg_get_indexdef(i.oid) AS definition,
        ix.indisvalid AS is_valid
    FROM pg_index AS ix
    JOIN pg_class AS i ON i.oid = ix.indexrelid
    JOIN pg_class AS t ON t.oid = ix.indrelid
    JOIN pg_namespace AS n ON n.oid = t.relnamespace
    WHERE t.relname = $1 AND n.nspname = current_schema()
    ORDER BY i.relname
"#;

const TABLE_STATS_SQL: &str = r#"
    SELECT
        pg_total_relation_size(c.oid) AS total_bytes,
        pg_relation_size(c.oid) AS table_bytes,
        pg_indexes_size(c.oid) AS index_bytes,
        pg_size_pretty(pg_total_relation_size(c.oid)) AS total_size,
        pg_size_pretty(pg_relation_size(c.oid)) AS table_size,
        pg_size_pretty(pg_indexes_size(c.oid)) AS index_size,
        GREATEST(c.reltuples, 0)::bigint AS row_count,
        false AS row_count_exact
    FROM pg_class AS c
    JOIN pg_namespace AS n ON n.oid = c.relnamespace
    WHERE c.relname = $1 AND n.nspname = current_schema() AND c.relkind IN ('r', 'p')
"#;

/// Owns the run's connection pool and issues all catalog reads and schema statements.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` around an established pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Checks a connection out of the pool.
    ///
    /// Waits at most the configured acquire timeout (`DbError::PoolTimeout` past it).
    /// The connection goes back to the pool when dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, DbError> {
        Ok(self.pool.acquire().await?)
    }

    /// Drains and closes every connection. Consumes the repository, so it runs once.
    pub async fn shutdown(self) {
        self.pool.close().await;
        tracing::debug!("Connection pool closed.");
    }
}

#[async_trait]
impl SchemaStore for DbRepository {
    async fn list_indexes(&self, table: &str) -> Result<Vec<ObservedIndex>, DbError> {
        validate_identifier(table)?;
        let mut conn = self.acquire().await?;
        let indexes = sqlx::query_as::<_, ObservedIndex>(LIST_INDEXES_SQL)
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;
        Ok(indexes)
    }

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let mut conn = self.acquire().await?;
        // Simple-query protocol: no prepare, no implicit transaction block, so
        // `CREATE INDEX CONCURRENTLY` is accepted.
        let result = (&mut *conn).execute(sqlx::raw_sql(sql)).await?;
        Ok(result.rows_affected())
    }

    async fn execute_in_transaction(&self, statements: &[String]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut rows_affected = 0;
        for statement in statements {
            rows_affected += (&mut *tx).execute(sqlx::raw_sql(statement)).await?.rows_affected();
        }
        // Dropping `tx` on an early return rolls back.
        tx.commit().await?;
        Ok(rows_affected)
    }

    async fn count(&self, sql: &str) -> Result<i64, DbError> {
        let mut conn = self.acquire().await?;
        let count = sqlx::query_scalar::<_, i64>(sql).fetch_one(&mut *conn).await?;
        Ok(count)
    }

    async fn table_stats(&self, table: &str, exact_row_count: bool) -> Result<TableStats, DbError> {
        validate_identifier(table)?;
        let mut stats = {
            let mut conn = self.acquire().await?;
            sqlx::query_as::<_, TableStats>(TABLE_STATS_SQL)
                .bind(table)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::TableNotFound(table.to_string()))?
        };

        if exact_row_count {
            stats.row_count = self
                .count(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
                .await?;
            stats.row_count_exact = true;
        }

        Ok(stats)
    }
}
