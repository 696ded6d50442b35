//! Type database - the registry of named, queryable types
//!
//! Registration makes a record reachable by name and indexes its attributes.
//! The record itself exists independently: `TypeInfo::of::<T>()` works for
//! unregistered types, while `TypeInfo::get(name)` only finds registered ones.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::descriptor::Reflect;
use crate::factory::TypeFactory;
use crate::guard::AccessGuard;
use crate::query::TypeQuery;
use crate::type_data::TypeData;
use crate::type_info::TypeInfo;

/// Name and attribute indexes
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) types: HashMap<String, TypeInfo>,
    pub(crate) by_attribute: HashMap<String, HashSet<TypeInfo>>,
}

impl Registry {
    /// Register a record by name, indexing its current attributes
    fn insert(&mut self, data: &'static TypeData) {
        let info = TypeInfo::from_data(data);
        match self.types.get(data.name()) {
            Some(existing) if *existing == info => return,
            Some(_) => {
                log::warn!(
                    "Type name '{}' already registered by a different type, keeping the first",
                    data.name()
                );
                return;
            }
            None => {}
        }

        self.types.insert(data.name().to_string(), info);
        let attributes: Vec<String> = data
            .members()
            .attributes
            .names()
            .map(str::to_string)
            .collect();
        for attribute in attributes {
            self.index_attribute(&attribute, info);
        }
        log::debug!("Registered type '{}'", data.name());
    }

    /// Add a registered type to an attribute bucket
    pub(crate) fn index_attribute(&mut self, attribute: &str, info: TypeInfo) {
        if self.types.get(info.name()) != Some(&info) {
            return;
        }
        self.by_attribute
            .entry(attribute.to_string())
            .or_default()
            .insert(info);
    }

    fn remove(&mut self, name: &str) -> Option<TypeInfo> {
        let info = self.types.remove(name)?;
        self.by_attribute.retain(|_, bucket| {
            bucket.remove(&info);
            !bucket.is_empty()
        });
        Some(info)
    }
}

static INSTANCE: Lazy<TypeDatabase> = Lazy::new(TypeDatabase::new);

/// Registry of named types behind a reader/writer lock
///
/// Lookups and queries share the lock; registration and reset take it
/// exclusively.
pub struct TypeDatabase {
    registry: AccessGuard<Registry>,
}

impl TypeDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            registry: AccessGuard::new(Registry::default()),
        }
    }

    /// The process-wide database
    pub fn instance() -> &'static TypeDatabase {
        &INSTANCE
    }

    /// Register `T` by name and start declaring members
    ///
    /// Registering an already registered type keeps its existing entry. The
    /// factory holds the exclusive lock until dropped.
    pub fn reflect<T: Reflect>(&self) -> TypeFactory<'_, T> {
        // Resolved before locking: building a record never touches the database.
        let data = TypeData::of::<T>();
        let mut registry = self.registry.access();
        registry.insert(data);
        TypeFactory::new(data, registry)
    }

    /// Look up a registered type; invalid if absent
    pub fn get(&self, name: &str) -> TypeInfo {
        self.registry
            .access_shared()
            .types
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.registry.access_shared().types.contains_key(name)
    }

    /// Unregister `name` and restore its record to the described defaults
    pub fn reset(&self, name: &str) -> bool {
        let mut registry = self.registry.access();
        let Some(info) = registry.remove(name) else {
            return false;
        };
        if let Some(data) = info.data() {
            data.reset();
        }
        log::debug!("Reset type '{}'", name);
        true
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.access_shared().types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.registry.access_shared().types.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a type query under a shared lock
    pub fn query(&self) -> TypeQuery<'_> {
        TypeQuery::new(self.registry.access_shared())
    }
}

impl Default for TypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Sprite {
        frame: u16,
    }

    impl Reflect for Sprite {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("db_test::Sprite").copyable().comparable().default_constructible();
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Tag;

    impl Reflect for Tag {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("db_test::Tag").copyable();
        }
    }

    #[test]
    fn test_reflect_get_reset() {
        let db = TypeDatabase::new();
        assert!(!db.get("db_test::Sprite").is_valid());

        db.reflect::<Sprite>().constant("FIRST", Sprite { frame: 1 }).attribute(Tag);
        let info = db.get("db_test::Sprite");
        assert_eq!(info, TypeInfo::of::<Sprite>());
        assert!(info.constant("FIRST").is_some());
        assert_eq!(db.len(), 1);

        assert!(db.reset("db_test::Sprite"));
        assert!(!db.get("db_test::Sprite").is_valid());
        assert!(!db.reset("db_test::Sprite"));
        // The record survives with its described defaults only.
        assert!(TypeInfo::of::<Sprite>().constant("FIRST").is_none());
        assert_eq!(TypeInfo::of::<Sprite>().constructors().len(), 2);
    }

    #[test]
    fn test_repeated_reflect_does_not_duplicate() {
        let db = TypeDatabase::new();
        struct Marker;
        impl Reflect for Marker {}

        db.reflect::<Marker>().attribute(Tag);
        db.reflect::<Marker>();
        assert_eq!(db.len(), 1);
        assert_eq!(db.query().with_attribute::<Tag>().types().len(), 1);
    }

    #[test]
    fn test_reflect_backfills_attribute_index() {
        struct Late;
        impl Reflect for Late {}

        let first = TypeDatabase::new();
        first.reflect::<Late>().attribute(Tag);

        let second = TypeDatabase::new();
        second.reflect::<Late>();
        assert!(second.query().with_attribute::<Tag>().types().contains(&TypeInfo::of::<Late>()));
    }
}
