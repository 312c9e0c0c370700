pub mod dates;
pub mod db;
pub mod models;
pub mod wizard;

pub use db::repository::{DocumentRepository, RepositoryError};
pub use models::*;
pub use wizard::{WizardController, WizardError};
