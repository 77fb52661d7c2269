use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Timed out after {0:?} establishing the connection pool")]
    ConnectTimeout(Duration),

    #[error("Timed out waiting for a pooled connection")]
    PoolTimeout,

    #[error("The connection pool has been shut down")]
    PoolClosed,

    #[error("Database statement failed: {0}")]
    QueryError(#[source] sqlx::Error),

    #[error("Table '{0}' was not found in the current schema.")]
    TableNotFound(String),

    #[error("Refusing to build SQL: {0}")]
    InvalidIdentifier(#[from] core_types::CoreError),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => DbError::PoolTimeout,
            sqlx::Error::PoolClosed => DbError::PoolClosed,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => DbError::ConnectionError(e),
            other => DbError::QueryError(other),
        }
    }
}

impl DbError {
    /// Whether the failure means the database is unusable for the rest of the run.
    ///
    /// Statement-level failures are not fatal; the caller records them and moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionError(_)
                | DbError::ConnectTimeout(_)
                | DbError::PoolTimeout
                | DbError::PoolClosed
        )
    }

    /// The server's message without the wrapper text, for report rows.
    pub fn detail(&self) -> String {
        match self {
            DbError::QueryError(sqlx::Error::Database(db)) => match db.code() {
                Some(code) => format!("{} (SQLSTATE {})", db.message(), code),
                None => db.message().to_string(),
            },
            other => other.to_string(),
        }
    }
}
