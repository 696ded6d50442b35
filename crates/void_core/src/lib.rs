//! # void_core - Void Engine Core
//!
//! Engine-level collaborators of the reflection layer:
//! - **Modules**: register, load and unload units of code that bring their
//!   own reflected types, with version-checked dependencies
//! - **Config**: named reflected values loaded from and saved to JSON
//!   through a per-type `ConfigType` attribute
//! - **Versions**: semantic versions with a compatibility rule
//!
//! ## Philosophy
//! "Everything is a Module" - a module's types exist exactly while the
//! module is loaded.

pub mod config;
pub mod error;
pub mod module;
pub mod version;

pub use config::*;
pub use error::*;
pub use module::*;
pub use version::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigRegistry, ConfigResult, ConfigType};
    pub use crate::error::{ConfigError, Error, ModuleError, Result};
    pub use crate::module::{
        Dependency, Module, ModuleContext, ModuleId, ModuleRegistry, ModuleResult, ModuleStatus,
    };
    pub use crate::version::Version;
}
