use std::{fmt, sync::Arc};

use stride_core::application::ProgressService;
use stride_core::database::PostgresDatabase;

use crate::infra::config::{Config, StorageBackend};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProgressService>,
    pub config: Arc<Config>,
    pub backend: StorageBackend,
    /// Present only for the postgres backend
    pub postgres: Option<Arc<PostgresDatabase>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        service: ProgressService,
        config: Arc<Config>,
        backend: StorageBackend,
        postgres: Option<Arc<PostgresDatabase>>,
    ) -> Self {
        Self {
            service: Arc::new(service),
            config,
            backend,
            postgres,
        }
    }

    pub fn service(&self) -> &ProgressService {
        &self.service
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
