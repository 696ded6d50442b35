//! Config registry - named reflected values backed by JSON documents
//!
//! A type takes part by carrying a [`ConfigType`] attribute:
//!
//! ```ignore
//! TypeInfo::reflect::<Window>().attribute(ConfigType::of::<Window>());
//! ```
//!
//! Documents map keys to a registered type name and a value:
//!
//! ```json
//! { "window": { "type": "Window", "value": { "width": 1280, "height": 720 } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use void_reflect::{Any, Descriptor, Reflect, TypeDatabase, TypeInfo};

use crate::error::ConfigError;

/// Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Writes an erased value as JSON
pub type SerializeFn = fn(&Any<'_>) -> ConfigResult<Value>;

/// Reads JSON into a fresh owned value
pub type DeserializeFn = fn(&Value) -> ConfigResult<Any<'static>>;

/// Attribute marking a type as config-serializable
#[derive(Clone, Copy)]
pub struct ConfigType {
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl ConfigType {
    /// Thunks going through `T`'s serde implementation
    pub fn of<T: Reflect + Serialize + DeserializeOwned>() -> Self {
        Self {
            serialize: serialize_thunk::<T>,
            deserialize: deserialize_thunk::<T>,
        }
    }

    /// Custom thunks
    pub fn with(serialize: SerializeFn, deserialize: DeserializeFn) -> Self {
        Self {
            serialize,
            deserialize,
        }
    }

    /// Serialize a value of the attributed type
    pub fn serialize(&self, value: &Any<'_>) -> ConfigResult<Value> {
        (self.serialize)(value)
    }

    /// Deserialize a value of the attributed type
    pub fn deserialize(&self, json: &Value) -> ConfigResult<Any<'static>> {
        (self.deserialize)(json)
    }
}

impl Reflect for ConfigType {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("void_core::ConfigType").copyable();
    }
}

fn serialize_thunk<T: Reflect + Serialize>(value: &Any<'_>) -> ConfigResult<Value> {
    Ok(serde_json::to_value(value.cast::<T>()?)?)
}

fn deserialize_thunk<T: Reflect + DeserializeOwned>(json: &Value) -> ConfigResult<Any<'static>> {
    let value: T = serde_json::from_value(json.clone())?;
    Ok(Any::new(value))
}

/// Named store of reflected values
pub struct ConfigRegistry<'d> {
    database: &'d TypeDatabase,
    entries: BTreeMap<String, Any<'static>>,
}

impl ConfigRegistry<'static> {
    /// Registry resolving types through the process-wide database
    pub fn new() -> Self {
        Self::with_database(TypeDatabase::instance())
    }
}

impl<'d> ConfigRegistry<'d> {
    /// Registry resolving types through a specific database
    pub fn with_database(database: &'d TypeDatabase) -> Self {
        Self {
            database,
            entries: BTreeMap::new(),
        }
    }

    /// Store a value, replacing any previous one
    pub fn set(&mut self, key: &str, value: Any<'static>) -> Option<Any<'static>> {
        self.entries.insert(key.to_string(), value)
    }

    /// Store a typed value
    pub fn insert<T: Reflect>(&mut self, key: &str, value: T) -> Option<Any<'static>> {
        self.set(key, Any::new(value))
    }

    /// Const reference to a stored value
    pub fn get(&self, key: &str) -> Option<Any<'_>> {
        self.entries.get(key).map(Any::as_ref)
    }

    /// Typed access, including through declared parents
    pub fn get_as<T: Reflect>(&self, key: &str) -> ConfigResult<&T> {
        let value = self
            .entries
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        Ok(value.cast::<T>()?)
    }

    /// Typed mutable access
    pub fn get_mut<T: Reflect>(&mut self, key: &str) -> ConfigResult<&mut T> {
        let value = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        Ok(value.cast_mut::<T>()?)
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Any<'static>> {
        self.entries.remove(key)
    }

    /// Check for a key
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a parsed document into the registry
    ///
    /// Nothing is stored unless every entry resolves and deserializes.
    /// Returns the number of entries loaded.
    pub fn load_value(&mut self, document: &Value) -> ConfigResult<usize> {
        let entries = document
            .as_object()
            .ok_or_else(|| ConfigError::InvalidDocument("expected an object at the top level".into()))?;

        let mut loaded = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let type_name = entry
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| ConfigError::InvalidDocument(format!("'{}' has no type name", key)))?;
            let json = entry
                .get("value")
                .ok_or_else(|| ConfigError::InvalidDocument(format!("'{}' has no value", key)))?;

            let ty = self.database.get(type_name);
            if !ty.is_valid() {
                return Err(ConfigError::UnknownType(type_name.to_string()));
            }
            let config = config_type(ty)?;
            let value = config.deserialize(json)?;
            if value.type_info() != ty {
                return Err(ConfigError::InvalidDocument(format!(
                    "'{}' deserialized as '{}', expected '{}'",
                    key,
                    value.type_info().name(),
                    type_name
                )));
            }
            loaded.push((key.clone(), value));
        }

        let count = loaded.len();
        self.entries.extend(loaded);
        log::debug!("Loaded {} config entries", count);
        Ok(count)
    }

    /// Merge a JSON string into the registry
    pub fn load_str(&mut self, json: &str) -> ConfigResult<usize> {
        let document: Value = serde_json::from_str(json)?;
        self.load_value(&document)
    }

    /// Merge a JSON file into the registry
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&text)
    }

    /// Write every stored value as a document
    pub fn to_value(&self) -> ConfigResult<Value> {
        let mut document = Map::new();
        for (key, value) in &self.entries {
            let ty = value.type_info();
            let json = config_type(ty)?.serialize(value)?;
            let mut entry = Map::new();
            entry.insert("type".into(), Value::String(ty.name().to_string()));
            entry.insert("value".into(), json);
            document.insert(key.clone(), Value::Object(entry));
        }
        Ok(Value::Object(document))
    }

    /// Write every stored value as pretty-printed JSON
    pub fn to_string_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// Write every stored value to a JSON file
    pub fn save_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let text = self.to_string_pretty()?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Saved {} config entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

impl Default for ConfigRegistry<'static> {
    fn default() -> Self {
        Self::new()
    }
}

fn config_type(ty: TypeInfo) -> ConfigResult<ConfigType> {
    ty.get_attribute::<ConfigType>()
        .map(|config| *config)
        .ok_or_else(|| ConfigError::NotConfigurable(ty.name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        height: u32,
    }

    impl Reflect for Window {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("config_test::Window").copyable().comparable().debuggable();
        }
    }

    struct Opaque;

    impl Reflect for Opaque {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("config_test::Opaque");
        }
    }

    fn database() -> TypeDatabase {
        let db = TypeDatabase::new();
        db.reflect::<Window>().attribute(ConfigType::of::<Window>());
        db.reflect::<Opaque>();
        db
    }

    #[test]
    fn test_load_and_save_round_trip() {
        let db = database();
        let mut config = ConfigRegistry::with_database(&db);
        let loaded = config
            .load_str(r#"{ "main": { "type": "config_test::Window", "value": { "width": 800, "height": 600 } } }"#)
            .unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(config.get_as::<Window>("main").unwrap(), &Window { width: 800, height: 600 });

        config.get_mut::<Window>("main").unwrap().width = 1024;
        let saved = config.to_value().unwrap();
        assert_eq!(saved["main"]["type"], "config_test::Window");
        assert_eq!(saved["main"]["value"]["width"], 1024);

        let mut reloaded = ConfigRegistry::with_database(&db);
        reloaded.load_value(&saved).unwrap();
        assert_eq!(reloaded.get_as::<Window>("main").unwrap().width, 1024);
    }

    #[test]
    fn test_unknown_and_unconfigurable_types() {
        let db = database();
        let mut config = ConfigRegistry::with_database(&db);
        assert!(matches!(
            config.load_str(r#"{ "a": { "type": "config_test::Missing", "value": 1 } }"#),
            Err(ConfigError::UnknownType(_))
        ));
        assert!(matches!(
            config.load_str(r#"{ "a": { "type": "config_test::Opaque", "value": null } }"#),
            Err(ConfigError::NotConfigurable(_))
        ));

        config.insert("opaque", Opaque);
        assert!(matches!(config.to_value(), Err(ConfigError::NotConfigurable(_))));
    }

    #[test]
    fn test_failed_load_stores_nothing() {
        let db = database();
        let mut config = ConfigRegistry::with_database(&db);
        let result = config.load_str(
            r#"{
                "good": { "type": "config_test::Window", "value": { "width": 1, "height": 2 } },
                "bad": { "type": "config_test::Window", "value": "oops" }
            }"#,
        );
        assert!(matches!(result, Err(ConfigError::Json(_))));
        assert!(config.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let db = database();
        let mut config = ConfigRegistry::with_database(&db);
        assert!(matches!(config.load_str("[]"), Err(ConfigError::InvalidDocument(_))));
        assert!(matches!(
            config.load_str(r#"{ "a": { "value": 1 } }"#),
            Err(ConfigError::InvalidDocument(_))
        ));
        assert!(matches!(config.get_as::<Window>("nope"), Err(ConfigError::MissingKey(_))));
    }
}
