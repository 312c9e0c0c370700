//! `doc-intake` configuration: an optional TOML file, overridden field by
//! field from the command line.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "intake.db"
//!
//! [user]
//! name = "alice"
//! responsibility_centre_id = 1
//!
//! [logging]
//! level = "debug"
//! file = "doc-intake.log"
//! ```

use std::path::{Path, PathBuf};

use intake_core::UserProfile;
use intake_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let DbConfig {
            backend,
            connection_string,
        } = DbConfig::default();
        Self {
            backend,
            connection_string,
        }
    }
}

impl DatabaseConfig {
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.backend.clone(),
            connection_string: self.connection_string.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub responsibility_centre_id: Option<i64>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: std::env::var("USER").unwrap_or_else(|_| "intake".to_string()),
            responsibility_centre_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Log file opened in append mode alongside stdout.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub user: UserConfig,
    pub logging: LoggingConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub user: Option<String>,
    pub centre: Option<i64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// File values (or defaults when `path` is `None`) with `overrides`
    /// applied on top.
    pub fn resolve(
        path: Option<&Path>,
        overrides: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(
        &mut self,
        overrides: CliOverrides,
    ) {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(db) = overrides.db {
            self.database.connection_string = db;
        }
        if let Some(user) = overrides.user {
            self.user.name = user;
        }
        if let Some(centre) = overrides.centre {
            self.user.responsibility_centre_id = Some(centre);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
    }

    pub fn profile(&self) -> UserProfile {
        let profile = UserProfile::new(&self.user.name);
        match self.user.responsibility_centre_id {
            Some(centre) => profile.with_centre(centre),
            None => profile,
        }
    }
}
