use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::records::RecordStorage;

/// Shared handler state
///
/// Cheap to clone: storage and the JWT service are reference counted.
///
/// ```ignore
/// let state = ServerState::initialize(&config)?;
/// let record = state.storage.get_record("PI_123")?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    /// Records and doc counters (one redb database)
    pub storage: RecordStorage,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, storage: RecordStorage) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            storage,
            jwt_service,
        }
    }

    /// Create the work directory and open the database inside it
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.database_path();
        let storage = RecordStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "record database opened");
        Ok(Self::new(config.clone(), storage))
    }

    /// State backed by an in-memory database
    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self::new(config, RecordStorage::open_in_memory()?))
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
