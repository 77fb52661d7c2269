use crate::error::DbError;
use crate::repository::DbRepository;
use configuration::{ConnectionDescriptor, PoolSettings};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

pub const APPLICATION_NAME: &str = "vigil";

/// Establishes the process-wide connection pool for one run.
///
/// The pool is small and fixed: this is a batch tool, and the pool size doubles as
/// the bound on concurrent index builds. Establishing it is bounded by the connect
/// timeout; later checkouts are bounded by the acquire timeout.
pub async fn connect(
    descriptor: &ConnectionDescriptor,
    settings: &PoolSettings,
) -> Result<DbRepository, DbError> {
    tracing::info!(
        host = %descriptor.host,
        port = descriptor.port,
        database = %descriptor.database,
        tls = descriptor.tls_required,
        "Connecting to the database."
    );
    connect_with_options(connect_options(descriptor), settings).await
}

/// Builds a pool from prepared connect options.
pub async fn connect_with_options(
    options: PgConnectOptions,
    settings: &PoolSettings,
) -> Result<DbRepository, DbError> {
    let pool_options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(0)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(settings.idle_timeout());

    let pool = tokio::time::timeout(settings.connect_timeout(), pool_options.connect_with(options))
        .await
        .map_err(|_| DbError::ConnectTimeout(settings.connect_timeout()))?
        .map_err(DbError::ConnectionError)?;

    Ok(DbRepository::new(pool))
}

/// Translates the resolved credentials into driver options.
///
/// Options are set field by field so passwords never need URL escaping.
pub fn connect_options(descriptor: &ConnectionDescriptor) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&descriptor.host)
        .port(descriptor.port)
        .database(&descriptor.database)
        .username(&descriptor.user)
        .password(&descriptor.password)
        .ssl_mode(if descriptor.tls_required {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        })
        .application_name(APPLICATION_NAME)
}
