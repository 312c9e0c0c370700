use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::repository::{DocumentRepository, RepositoryError};

/// Backend used when the configuration names none.
pub const DEFAULT_BACKEND: &str = "sqlite";
/// Document store used when the configuration names none.
pub const DEFAULT_DATABASE: &str = "intake.db";
/// Connection string of a throwaway in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// Where the document services live.
///
/// `backend` picks the registered [`RepositoryFactory`]; `connection_string`
/// is handed to it untouched. For `sqlite` that is a file such as
/// `intake.db`, or `:memory:` for a seeded scratch store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            connection_string: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl DbConfig {
    /// The default backend over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self {
            connection_string: IN_MEMORY.to_string(),
            ..Self::default()
        }
    }

    /// True when nothing written through this configuration outlives the
    /// process.
    pub fn is_in_memory(&self) -> bool {
        self.connection_string.contains(IN_MEMORY)
    }
}

/// Opens the document services for one backend. Each backend crate exports
/// a unit struct implementing this, registered at start-up.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Connect and return a repository ready for the wizard, with reference
    /// data (types, circuits, centres) in place.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Arc<dyn DocumentRepository>, RepositoryError>;
}

/// The backends a binary was built with, keyed by name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `factory`, replacing any earlier one with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        debug!(backend = factory.backend_name(), "backend registered");
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Open the repository `config` describes. The backend name is matched
    /// case-insensitively.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] naming the requested and the
    ///   available backends when none matches.
    /// * Whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Arc<dyn DocumentRepository>, RepositoryError> {
        let backend = config.backend.trim().to_ascii_lowercase();
        let Some(factory) = self.factories.get(backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        if config.is_in_memory() {
            info!(%backend, "opening in-memory document store; nothing will be kept");
        }
        factory.create(config).await
    }
}
