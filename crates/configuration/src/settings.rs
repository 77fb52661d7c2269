use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root settings structure for a single run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Location of the `key=value` credential file.
    pub credentials_path: PathBuf,
    pub pool: PoolSettings,
    pub audit: AuditSettings,
}

/// Sizing and timeouts for the connection pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSettings {
    /// Also the upper bound on concurrent index builds.
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    /// Idle connections older than this are closed and replaced on demand.
    pub idle_timeout_secs: u64,
}

impl PoolSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 3,
            connect_timeout_secs: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 60,
        }
    }
}

/// Parameters for the index audit.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    pub table: String,
    /// Build missing indexes with `CONCURRENTLY` so writers are never blocked.
    pub concurrent_builds: bool,
    /// Report `COUNT(*)` instead of the planner's row estimate. Slow on large tables.
    pub exact_row_count: bool,
    /// Row count from which a run that could not create any missing index is a hard failure.
    pub non_trivial_rows: i64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            table: core_types::EVENTS_TABLE.to_string(),
            concurrent_builds: true,
            exact_row_count: false,
            non_trivial_rows: 10_000,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }
        if self.pool.acquire_timeout_secs == 0 || self.pool.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pool timeouts must be at least one second".to_string(),
            ));
        }
        core_types::validate_identifier(&self.audit.table)
            .map_err(|e| ConfigError::ValidationError(format!("audit.table: {}", e)))?;
        Ok(())
    }
}

/// Seeds a builder with the compiled-in defaults so every key is optional in files and env.
pub(crate) fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let pool = PoolSettings::default();
    let audit = AuditSettings::default();
    Ok(builder
        .set_default("credentials_path", ".credentials")?
        .set_default("pool.max_connections", pool.max_connections)?
        .set_default("pool.connect_timeout_secs", pool.connect_timeout_secs)?
        .set_default("pool.acquire_timeout_secs", pool.acquire_timeout_secs)?
        .set_default("pool.idle_timeout_secs", pool.idle_timeout_secs)?
        .set_default("audit.table", audit.table)?
        .set_default("audit.concurrent_builds", audit.concurrent_builds)?
        .set_default("audit.exact_row_count", audit.exact_row_count)?
        .set_default("audit.non_trivial_rows", audit.non_trivial_rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_settings_from;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_settings_file() {
        let settings = load_settings_from("definitely-not-a-vigil-settings-file").unwrap();
        assert_eq!(settings.credentials_path, PathBuf::from(".credentials"));
        assert_eq!(settings.audit.table, "events");
        assert!(settings.audit.concurrent_builds);
        assert_eq!(settings.pool.acquire_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "credentials_path = \"/etc/vigil/db.env\"").unwrap();
        writeln!(file, "[pool]\nmax_connections = 1").unwrap();
        writeln!(file, "[audit]\nexact_row_count = true").unwrap();
        drop(file);

        let stem = dir.path().join("vigil");
        let settings = load_settings_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(settings.credentials_path, PathBuf::from("/etc/vigil/db.env"));
        assert_eq!(settings.pool.max_connections, 1);
        assert_eq!(settings.pool.idle_timeout_secs, 60);
        assert!(settings.audit.exact_row_count);
    }

    #[test]
    fn rejects_a_zero_sized_pool_and_unsafe_table_names() {
        let mut settings = Settings {
            credentials_path: PathBuf::from(".credentials"),
            pool: PoolSettings::default(),
            audit: AuditSettings::default(),
        };
        assert!(settings.validate().is_ok());

        settings.pool.max_connections = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::ValidationError(_))));

        settings.pool.max_connections = 2;
        settings.audit.table = "events; drop table alerts".to_string();
        assert!(matches!(settings.validate(), Err(ConfigError::ValidationError(_))));
    }
}
