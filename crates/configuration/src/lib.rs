use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod credentials;
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use credentials::{ConnectionDescriptor, resolve};
pub use settings::{AuditSettings, PoolSettings, Settings};

/// The settings file looked up in the working directory (any format `config` knows, e.g. `vigil.toml`).
pub const SETTINGS_FILE: &str = "vigil";

/// Loads the run settings from defaults, an optional `vigil.toml` and `VIGIL__*` variables.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(SETTINGS_FILE)
}

/// Same as [`load_settings`] but with an explicit settings file stem.
///
/// A missing file is not an error; compiled-in defaults apply.
pub fn load_settings_from(file_stem: &str) -> Result<Settings, ConfigError> {
    let builder = settings::with_defaults(config::Config::builder())?
        .add_source(config::File::with_name(file_stem).required(false))
        // e.g. VIGIL__POOL__MAX_CONNECTIONS=2
        .add_source(
            config::Environment::with_prefix("VIGIL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
