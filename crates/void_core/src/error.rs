//! Error types for the module and config registries

use std::path::PathBuf;
use thiserror::Error;

use crate::module::ModuleStatus;
use crate::version::Version;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any core failure
#[derive(Debug, Error)]
pub enum Error {
    /// Module lifecycle error
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Module lifecycle errors
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    /// Module not registered
    #[error("Module not found: {0}")]
    NotFound(String),

    /// Module id already taken
    #[error("Module already registered: {0}")]
    AlreadyRegistered(String),

    /// Dependency not registered or not active
    #[error("Module '{module}' requires missing dependency '{dependency}'")]
    MissingDependency { module: String, dependency: String },

    /// Active dependency has an incompatible version
    #[error("Module '{module}' requires '{dependency}' {required}, found {found}")]
    VersionMismatch {
        module: String,
        dependency: String,
        required: Version,
        found: Version,
    },

    /// Active module still depended upon
    #[error("Module '{module}' is still required by '{dependent}'")]
    InUse { module: String, dependent: String },

    /// Operation not valid in the module's current status
    #[error("Module '{module}' is {status:?}")]
    InvalidState { module: String, status: ModuleStatus },

    /// Module's own load or unload hook failed
    #[error("Module '{module}' failed: {message}")]
    Failed { module: String, message: String },

    /// Reflection failure while registering types
    #[error("Reflection error: {0}")]
    Reflect(#[from] void_reflect::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Type name not registered in the database
    #[error("Unknown config type '{0}'")]
    UnknownType(String),

    /// Type has no `ConfigType` attribute
    #[error("Type '{0}' is not config-serializable")]
    NotConfigurable(String),

    /// Document does not have the expected structure
    #[error("Invalid config document: {0}")]
    InvalidDocument(String),

    /// Key not present in the registry
    #[error("Config key not found: {0}")]
    MissingKey(String),

    /// JSON encode or decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failure
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reflection failure while converting values
    #[error("Reflection error: {0}")]
    Reflect(#[from] void_reflect::Error),
}
