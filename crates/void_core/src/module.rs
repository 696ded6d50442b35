//! Module system - units of code that bring their own reflected types
//!
//! A module registers its types while loading, through a [`ModuleContext`]
//! that remembers every name it reflects. Unloading resets those names in
//! the type database, so nothing the module declared stays resolvable once
//! the module is gone.

use std::collections::BTreeMap;
use std::fmt;

use void_reflect::{Reflect, TypeDatabase, TypeFactory, TypeInfo};

use crate::error::ModuleError;
use crate::version::Version;

/// Result type for module operations
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;

/// Unique identifier for a module
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(Box<str>);

impl ModuleId {
    /// Create a new module ID
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    /// Get the module name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// A required module and the version it must be compatible with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub id: ModuleId,
    pub version: Version,
}

impl Dependency {
    /// Require `id` at a version compatible with `version`
    pub fn new(id: impl Into<ModuleId>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

/// Lifecycle status of a module
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleStatus {
    /// Registered but not loaded
    Registered,
    /// Load hook running
    Loading,
    /// Loaded and active
    Active,
    /// Unload hook running
    Unloading,
    /// Load or unload hook failed
    Failed,
}

/// Context handed to modules during load and unload
pub struct ModuleContext<'a> {
    module: &'a ModuleId,
    database: &'a TypeDatabase,
    reflected: &'a mut Vec<String>,
    modules: &'a BTreeMap<String, ModuleInfo>,
}

impl<'a> ModuleContext<'a> {
    /// The module being loaded or unloaded
    pub fn module(&self) -> &ModuleId {
        self.module
    }

    /// Register `T` and record it as used by this module
    ///
    /// A type stays registered until every module using it has unloaded.
    /// Types registered outside any module are extended but never claimed.
    /// The factory holds the database's exclusive lock; drop it before
    /// looking types up.
    pub fn reflect<T: Reflect>(&mut self) -> TypeFactory<'a, T> {
        let name = TypeInfo::of::<T>().name();
        let recorded = self.reflected.iter().any(|owned| owned == name);
        if !recorded {
            let claimed = self
                .modules
                .values()
                .any(|info| info.types.iter().any(|owned| owned == name));
            if claimed || !self.database.contains(name) {
                self.reflected.push(name.to_string());
            } else {
                log::debug!("Module '{}' extends external type '{}'", self.module, name);
            }
        }
        self.database.reflect::<T>()
    }

    /// Look up a registered type
    pub fn type_info(&self, name: &str) -> TypeInfo {
        self.database.get(name)
    }

    /// Names reflected by this module so far
    pub fn reflected(&self) -> &[String] {
        self.reflected
    }

    /// Whether another module is active
    pub fn is_active(&self, id: &ModuleId) -> bool {
        self.modules
            .get(id.name())
            .map_or(false, |info| info.status == ModuleStatus::Active)
    }
}

/// The module trait - the unit of registration and unregistration
pub trait Module: Send + Sync {
    /// Unique identifier for this module
    fn id(&self) -> ModuleId;

    /// Module version for compatibility checking
    fn version(&self) -> Version {
        Version::new(0, 1, 0)
    }

    /// Modules that must be active before this one loads
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Called when the module is loaded; register types here
    fn on_load(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult<()>;

    /// Called before the module's types are reset
    fn on_unload(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult<()> {
        let _ = ctx;
        Ok(())
    }
}

/// Metadata about a registered module
#[derive(Clone, Debug)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
    pub status: ModuleStatus,
    /// Type names the module reflected while loading
    pub types: Vec<String>,
}

/// Central registry for all modules
pub struct ModuleRegistry<'d> {
    database: &'d TypeDatabase,
    modules: BTreeMap<String, Box<dyn Module>>,
    info: BTreeMap<String, ModuleInfo>,
    load_order: Vec<ModuleId>,
}

impl ModuleRegistry<'static> {
    /// Registry over the process-wide type database
    pub fn new() -> Self {
        Self::with_database(TypeDatabase::instance())
    }
}

impl<'d> ModuleRegistry<'d> {
    /// Registry over a specific type database
    pub fn with_database(database: &'d TypeDatabase) -> Self {
        Self {
            database,
            modules: BTreeMap::new(),
            info: BTreeMap::new(),
            load_order: Vec::new(),
        }
    }

    /// Register a module without loading it
    pub fn register<M: Module + 'static>(&mut self, module: M) -> ModuleResult<()> {
        let id = module.id();
        let name = id.name().to_string();

        if self.modules.contains_key(&name) {
            return Err(ModuleError::AlreadyRegistered(name));
        }

        let info = ModuleInfo {
            id,
            version: module.version(),
            dependencies: module.dependencies(),
            status: ModuleStatus::Registered,
            types: Vec::new(),
        };

        log::debug!("Registered module '{}' {}", name, info.version);
        self.modules.insert(name.clone(), Box::new(module));
        self.info.insert(name, info);
        Ok(())
    }

    /// Load a registered module
    ///
    /// Every dependency must be active at a compatible version. If the load
    /// hook fails, the types it reflected are reset and the module is marked
    /// failed; a failed module may be loaded again.
    pub fn load(&mut self, id: &ModuleId) -> ModuleResult<()> {
        let name = id.name().to_string();
        let info = self.info_of(&name)?;
        if !matches!(info.status, ModuleStatus::Registered | ModuleStatus::Failed) {
            return Err(ModuleError::InvalidState {
                module: name,
                status: info.status,
            });
        }

        for dependency in &info.dependencies {
            let dep_name = dependency.id.name();
            let dep_info = self
                .info
                .get(dep_name)
                .filter(|dep_info| dep_info.status == ModuleStatus::Active)
                .ok_or_else(|| ModuleError::MissingDependency {
                    module: name.clone(),
                    dependency: dep_name.to_string(),
                })?;
            if !dep_info.version.is_compatible_with(&dependency.version) {
                return Err(ModuleError::VersionMismatch {
                    module: name.clone(),
                    dependency: dep_name.to_string(),
                    required: dependency.version,
                    found: dep_info.version,
                });
            }
        }

        self.set_status(&name, ModuleStatus::Loading);
        let mut module = self.take_module(&name)?;
        let mut reflected = Vec::new();
        let result = {
            let mut ctx = ModuleContext {
                module: id,
                database: self.database,
                reflected: &mut reflected,
                modules: &self.info,
            };
            module.on_load(&mut ctx)
        };
        self.modules.insert(name.clone(), module);

        if let Err(e) = result {
            log::warn!("Module '{}' failed to load: {}", name, e);
            self.reset_types(&name, &reflected);
            self.set_status(&name, ModuleStatus::Failed);
            return Err(e);
        }

        log::info!("Loaded module '{}' ({} types)", name, reflected.len());
        if let Some(info) = self.info.get_mut(&name) {
            info.types = reflected;
        }
        self.set_status(&name, ModuleStatus::Active);
        self.load_order.push(id.clone());
        Ok(())
    }

    /// Unload an active module and reset the types only it was using
    ///
    /// Fails while another active module depends on it. The types are reset
    /// even when the unload hook fails; the module is then marked failed.
    pub fn unload(&mut self, id: &ModuleId) -> ModuleResult<()> {
        let name = id.name().to_string();
        let info = self.info_of(&name)?;
        if info.status != ModuleStatus::Active {
            return Err(ModuleError::InvalidState {
                module: name,
                status: info.status,
            });
        }
        if let Some(dependent) = self.active_dependent(&name) {
            return Err(ModuleError::InUse {
                module: name,
                dependent,
            });
        }

        self.set_status(&name, ModuleStatus::Unloading);
        let mut module = self.take_module(&name)?;
        let mut reflected = info.types;
        let result = {
            let mut ctx = ModuleContext {
                module: id,
                database: self.database,
                reflected: &mut reflected,
                modules: &self.info,
            };
            module.on_unload(&mut ctx)
        };
        self.modules.insert(name.clone(), module);

        self.reset_types(&name, &reflected);
        if let Some(info) = self.info.get_mut(&name) {
            info.types.clear();
        }
        self.load_order.retain(|loaded| loaded.name() != name);

        match result {
            Ok(()) => {
                log::info!("Unloaded module '{}'", name);
                self.set_status(&name, ModuleStatus::Registered);
                Ok(())
            }
            Err(e) => {
                log::warn!("Module '{}' failed to unload cleanly: {}", name, e);
                self.set_status(&name, ModuleStatus::Failed);
                Err(e)
            }
        }
    }

    /// Unload every active module in reverse load order
    pub fn unload_all(&mut self) -> ModuleResult<()> {
        let mut first_error = None;
        for id in self.load_order.clone().iter().rev() {
            if let Err(e) = self.unload(id) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Get a module by ID
    pub fn get(&self, id: &ModuleId) -> Option<&dyn Module> {
        self.modules.get(id.name()).map(|m| m.as_ref())
    }

    /// Get module info
    pub fn info(&self, id: &ModuleId) -> Option<&ModuleInfo> {
        self.info.get(id.name())
    }

    /// Current status of a module
    pub fn status(&self, id: &ModuleId) -> Option<ModuleStatus> {
        self.info(id).map(|info| info.status)
    }

    /// Iterate over all active modules in load order
    pub fn active_modules(&self) -> impl Iterator<Item = &dyn Module> {
        self.load_order.iter().filter_map(|id| self.get(id))
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of active modules
    pub fn active_count(&self) -> usize {
        self.load_order.len()
    }

    fn info_of(&self, name: &str) -> ModuleResult<ModuleInfo> {
        self.info
            .get(name)
            .cloned()
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    fn take_module(&mut self, name: &str) -> ModuleResult<Box<dyn Module>> {
        self.modules
            .remove(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))
    }

    fn set_status(&mut self, name: &str, status: ModuleStatus) {
        if let Some(info) = self.info.get_mut(name) {
            info.status = status;
        }
    }

    fn active_dependent(&self, name: &str) -> Option<String> {
        self.info
            .values()
            .filter(|info| info.status == ModuleStatus::Active)
            .find(|info| info.dependencies.iter().any(|dep| dep.id.name() == name))
            .map(|info| info.id.name().to_string())
    }

    /// Reset `module`'s types that no other active module still uses
    fn reset_types(&self, module: &str, names: &[String]) {
        for type_name in names {
            if let Some(user) = self.type_user(module, type_name) {
                log::debug!("Type '{}' is still used by module '{}'", type_name, user);
                continue;
            }
            if !self.database.reset(type_name) {
                log::debug!("Type '{}' was not registered at reset", type_name);
            }
        }
    }

    fn type_user(&self, module: &str, type_name: &str) -> Option<&str> {
        self.info
            .values()
            .filter(|info| info.id.name() != module && info.status == ModuleStatus::Active)
            .find(|info| info.types.iter().any(|owned| owned == type_name))
            .map(|info| info.id.name())
    }
}

impl Default for ModuleRegistry<'static> {
    fn default() -> Self {
        Self::new()
    }
}
