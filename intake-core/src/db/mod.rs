pub mod factory;
pub mod repository;

pub use factory::{DEFAULT_BACKEND, DEFAULT_DATABASE, DbConfig, IN_MEMORY, RepositoryFactory, RepositoryRegistry};
pub use repository::{DocumentRepository, RepositoryError};
