//! Integration tests for void_core

use serde::{Deserialize, Serialize};
use void_core::prelude::*;
use void_reflect::{Descriptor, Reflect, TypeDatabase, TypeInfo};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Audio {
    volume: f32,
    muted: bool,
}

impl Reflect for Audio {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("core_it::Audio").copyable().comparable().debuggable().default_constructible();
    }
}

struct AudioModule;

impl Module for AudioModule {
    fn id(&self) -> ModuleId {
        ModuleId::new("audio")
    }

    fn version(&self) -> Version {
        void_core::version!(1, 4, 0)
    }

    fn on_load(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult<()> {
        ctx.reflect::<Audio>()
            .attribute(ConfigType::of::<Audio>())
            .constant("SILENT", Audio { volume: 0.0, muted: true });
        Ok(())
    }
}

struct BaseModule;

impl Module for BaseModule {
    fn id(&self) -> ModuleId {
        ModuleId::new("base")
    }

    fn version(&self) -> Version {
        Version::new(1, 4, 0)
    }

    fn on_load(&mut self, _ctx: &mut ModuleContext<'_>) -> ModuleResult<()> {
        Ok(())
    }
}

struct MixerModule {
    requires: Version,
}

impl Module for MixerModule {
    fn id(&self) -> ModuleId {
        ModuleId::new("mixer")
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("base", self.requires)]
    }

    fn on_load(&mut self, ctx: &mut ModuleContext<'_>) -> ModuleResult<()> {
        if !ctx.is_active(&ModuleId::new("base")) {
            return Err(ModuleError::Failed {
                module: ctx.module().to_string(),
                message: "base inactive".into(),
            });
        }
        Ok(())
    }
}

const DOCUMENT: &str = r#"{
    "master": { "type": "core_it::Audio", "value": { "volume": 0.5, "muted": false } }
}"#;

#[test]
fn test_module_types_drive_config() {
    init_logging();
    let db = TypeDatabase::new();
    let mut modules = ModuleRegistry::with_database(&db);
    modules.register(AudioModule).unwrap();

    let mut config = ConfigRegistry::with_database(&db);
    assert!(matches!(config.load_str(DOCUMENT), Err(ConfigError::UnknownType(_))));

    let audio = ModuleId::new("audio");
    modules.load(&audio).unwrap();
    assert_eq!(config.load_str(DOCUMENT).unwrap(), 1);
    assert_eq!(config.get_as::<Audio>("master").unwrap().volume, 0.5);

    let saved = config.to_string_pretty().unwrap();
    let mut copy = ConfigRegistry::with_database(&db);
    copy.load_str(&saved).unwrap();
    assert_eq!(copy.get_as::<Audio>("master").unwrap(), config.get_as::<Audio>("master").unwrap());

    modules.unload(&audio).unwrap();
    assert!(!db.get("core_it::Audio").is_valid());
    assert!(!TypeInfo::of::<Audio>().has_attribute::<ConfigType>());
    let mut after = ConfigRegistry::with_database(&db);
    assert!(after.load_str(DOCUMENT).is_err());
}

#[test]
fn test_dependency_checks() {
    init_logging();
    let db = TypeDatabase::new();
    let mut modules = ModuleRegistry::with_database(&db);
    modules.register(BaseModule).unwrap();
    modules
        .register(MixerModule { requires: Version::new(1, 2, 0) })
        .unwrap();

    let base = ModuleId::new("base");
    let mixer = ModuleId::new("mixer");

    assert!(matches!(
        modules.load(&mixer),
        Err(ModuleError::MissingDependency { .. })
    ));

    modules.load(&base).unwrap();
    modules.load(&mixer).unwrap();
    assert_eq!(modules.active_count(), 2);

    assert!(matches!(modules.unload(&base), Err(ModuleError::InUse { .. })));
    modules.unload_all().unwrap();
    assert_eq!(modules.active_count(), 0);
    assert_eq!(modules.status(&base), Some(ModuleStatus::Registered));
}

#[test]
fn test_incompatible_dependency_version() {
    let db = TypeDatabase::new();
    let mut modules = ModuleRegistry::with_database(&db);
    modules.register(BaseModule).unwrap();
    modules
        .register(MixerModule { requires: Version::new(2, 0, 0) })
        .unwrap();

    modules.load(&ModuleId::new("base")).unwrap();
    let err = modules.load(&ModuleId::new("mixer")).unwrap_err();
    assert!(matches!(err, ModuleError::VersionMismatch { .. }));
    assert_eq!(modules.status(&ModuleId::new("mixer")), Some(ModuleStatus::Registered));
    modules.unload_all().unwrap();
}
