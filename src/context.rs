use configuration::{ConnectionDescriptor, Settings};
use database::DbRepository;

/// Everything a run needs, built once at startup and passed by reference.
///
/// Owns the only database handle of the process; `close` must be called once
/// at the end of the run.
pub struct RunContext {
    pub settings: Settings,
    pub descriptor: ConnectionDescriptor,
    pub repo: DbRepository,
}

impl RunContext {
    /// Loads settings, resolves credentials and opens the pool.
    ///
    /// Configuration problems surface before any connection is attempted.
    pub async fn initialize() -> anyhow::Result<Self> {
        let settings = configuration::load_settings()?;
        let descriptor = configuration::resolve(&settings.credentials_path)?;
        let repo = database::connect(&descriptor, &settings.pool).await?;
        Ok(Self { settings, descriptor, repo })
    }

    pub async fn close(self) {
        self.repo.shutdown().await;
    }
}
