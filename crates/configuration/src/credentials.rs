//! Resolves the flat `key=value` credential file into a typed connection descriptor.
//!
//! The file is `.env` style:
//!
//! ```text
//! # production monitoring database
//! DB_HOST=ep-quiet-sun-123456.eu-central-1.aws.neon.tech
//! DB_PORT=5432
//! DB_DATABASE=postgres
//! DB_USERNAME=monitor
//! DB_PASSWORD=secret
//! ```
//!
//! Keys lose the `DB_` prefix (in any case) and are lower-cased. Values run from the
//! first `=` to the end of the line, untouched. Missing optional fields fall back
//! to local-development defaults instead of failing.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const KEY_PREFIX: &str = "DB_";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
/// The generic database name that is never the real monitoring database.
pub const PLACEHOLDER_DATABASE: &str = "postgres";
pub const FALLBACK_DATABASE: &str = "livewatch";

/// Hostname suffixes of managed Postgres providers, which only accept TLS connections.
pub const MANAGED_HOST_SUFFIXES: &[&str] = &[
    ".neon.tech",
    ".supabase.co",
    ".render.com",
    ".rds.amazonaws.com",
];

/// Everything needed to open a connection. Immutable for the run.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Derived from `host`, never read from the file.
    pub tls_required: bool,
    /// Keys the resolver does not use, kept as found (normalized names).
    pub extra: BTreeMap<String, String>,
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("tls_required", &self.tls_required)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads and resolves the credential file at `path`.
pub fn resolve(path: impl AsRef<Path>) -> Result<ConnectionDescriptor, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let descriptor = from_entries(parse_entries(&contents))?;
    tracing::debug!(?descriptor, path = %path.display(), "Resolved database credentials.");
    Ok(descriptor)
}

/// Splits every non-blank, non-comment line on its first `=`.
///
/// Values are taken verbatim: no quoting, escaping, `$` expansion or trailing
/// comments, since passwords may contain any of those characters.
pub fn parse_entries(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|line| match line.split_once('=') {
            Some((key, value)) => Some((key.trim().to_string(), value.to_string())),
            None => {
                tracing::warn!(line = line.trim(), "Ignoring credential line without '='.");
                None
            }
        })
        .collect()
}

/// Builds a descriptor from raw `(key, value)` pairs, in file order.
pub fn from_entries<I>(entries: I) -> Result<ConnectionDescriptor, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut fields: BTreeMap<String, String> = entries
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .collect();

    let host = take_non_empty(&mut fields, "host").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match take_non_empty(&mut fields, "port") {
        Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
            ConfigError::ValidationError(format!("port '{}' is not a valid TCP port", raw))
        })?,
        None => DEFAULT_PORT,
    };
    let database = match take_non_empty(&mut fields, "database") {
        Some(name) if name != PLACEHOLDER_DATABASE => name,
        _ => FALLBACK_DATABASE.to_string(),
    };
    let user = take_non_empty(&mut fields, "username")
        .or_else(|| take_non_empty(&mut fields, "user"))
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    let password = fields.remove("password").unwrap_or_default();
    let tls_required = requires_tls(&host);

    Ok(ConnectionDescriptor {
        host,
        port,
        database,
        user,
        password,
        tls_required,
        extra: fields,
    })
}

/// True iff `host` belongs to a managed provider that enforces TLS.
pub fn requires_tls(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    MANAGED_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_ascii_lowercase();
    let prefix = KEY_PREFIX.to_ascii_lowercase();
    match key.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => key,
    }
}

fn take_non_empty(fields: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    fields.remove(key).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn resolves_a_managed_host_with_tls() {
        let file = write_file(
            "# production\n\
             \n\
             DB_HOST=ep-quiet-sun-123456.eu-central-1.aws.neon.tech\n\
             DB_PORT=6543\n\
             DB_DATABASE=monitoring\n\
             DB_USERNAME=monitor\n\
             DB_PASSWORD=s3cr=t\n",
        );
        let descriptor = resolve(file.path()).unwrap();
        assert_eq!(descriptor.host, "ep-quiet-sun-123456.eu-central-1.aws.neon.tech");
        assert_eq!(descriptor.port, 6543);
        assert_eq!(descriptor.database, "monitoring");
        assert_eq!(descriptor.user, "monitor");
        assert_eq!(descriptor.password, "s3cr=t");
        assert!(descriptor.tls_required);
        assert!(descriptor.extra.is_empty());
    }

    #[test]
    fn placeholder_database_is_replaced() {
        let descriptor = from_entries(vec![("DB_DATABASE".to_string(), "postgres".to_string())]).unwrap();
        assert_eq!(descriptor.database, FALLBACK_DATABASE);
    }

    #[test]
    fn missing_fields_fall_back_to_local_defaults() {
        let file = write_file("# nothing but a comment\n");
        let descriptor = resolve(file.path()).unwrap();
        assert_eq!(descriptor.host, DEFAULT_HOST);
        assert_eq!(descriptor.port, DEFAULT_PORT);
        assert_eq!(descriptor.user, DEFAULT_USER);
        assert_eq!(descriptor.password, "");
        assert_eq!(descriptor.database, FALLBACK_DATABASE);
        assert!(!descriptor.tls_required);
    }

    #[test]
    fn keys_are_case_insensitive_and_unknown_keys_are_kept() {
        let descriptor = from_entries(vec![
            ("db_host".to_string(), "db.internal".to_string()),
            ("DB_User".to_string(), "ops".to_string()),
            ("DB_SSLROOTCERT".to_string(), "/etc/ca.pem".to_string()),
        ])
        .unwrap();
        assert_eq!(descriptor.host, "db.internal");
        assert_eq!(descriptor.user, "ops");
        assert_eq!(descriptor.extra.get("sslrootcert").map(String::as_str), Some("/etc/ca.pem"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = from_entries(vec![("DB_PORT".to_string(), "fifty".to_string())]).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn passwords_are_taken_verbatim() {
        let file = write_file(
            "DB_HOST=db.internal\n\
             DB_PASSWORD=p@ss$word1 #not a comment 'quoted' \\x\n",
        );
        let descriptor = resolve(file.path()).unwrap();
        assert_eq!(descriptor.password, "p@ss$word1 #not a comment 'quoted' \\x");
    }

    #[test]
    fn special_characters_never_fail_the_parse() {
        for password in ["my pass", "it's", "abc #tail", "pa$HOME", "=leading=equals"] {
            let file = write_file(&format!("DB_PASSWORD={password}\n"));
            let descriptor = resolve(file.path()).unwrap();
            assert_eq!(descriptor.password, password);
        }
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let entries = parse_entries("# comment\n\n   \nNOT A PAIR\nDB_PORT=5433\r\n");
        assert_eq!(entries, vec![("DB_PORT".to_string(), "5433".to_string())]);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path().join("missing.env")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn tls_is_inferred_from_the_host_suffix_only() {
        assert!(requires_tls("abc.SUPABASE.co"));
        assert!(requires_tls("mydb.cluster-xyz.us-east-1.rds.amazonaws.com"));
        assert!(!requires_tls("localhost"));
        assert!(!requires_tls("neon.tech.example.org"));
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let descriptor = from_entries(vec![("DB_PASSWORD".to_string(), "hunter2".to_string())]).unwrap();
        let rendered = format!("{:?}", descriptor);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
