//! Type query - incremental filtering of registered types
//!
//! The first filter seeds the working set: an attribute filter copies that
//! attribute's index bucket, every other filter scans the registered types.
//! Later filters only remove entries, so the result is the intersection of
//! all filters regardless of call order.

use std::collections::HashSet;

use crate::database::Registry;
use crate::descriptor::Reflect;
use crate::guard::Guarded;
use crate::type_info::TypeInfo;

/// Filter builder over a database's registered types
///
/// Holds the database's shared lock until dropped.
pub struct TypeQuery<'a> {
    registry: Guarded<'a, Registry>,
    types: Option<HashSet<TypeInfo>>,
}

impl<'a> TypeQuery<'a> {
    pub(crate) fn new(registry: Guarded<'a, Registry>) -> Self {
        Self {
            registry,
            types: None,
        }
    }

    /// Keep types carrying attribute `A`
    pub fn with_attribute<A: Reflect>(self) -> Self {
        let name = TypeInfo::of::<A>().name();
        self.with_attribute_named(name)
    }

    /// Keep types carrying the attribute with the given type name
    pub fn with_attribute_named(mut self, attribute: &str) -> Self {
        match &mut self.types {
            None => {
                let bucket = self
                    .registry
                    .by_attribute
                    .get(attribute)
                    .cloned()
                    .unwrap_or_default();
                self.types = Some(bucket);
            }
            Some(types) => {
                let bucket = self.registry.by_attribute.get(attribute);
                types.retain(|info| bucket.map_or(false, |bucket| bucket.contains(info)));
            }
        }
        self
    }

    /// Keep types with a constant named `name`
    pub fn with_constant(self, name: &str) -> Self {
        self.filter(|info| info.constant(name).is_some())
    }

    /// Keep types with a constant named `name` of exactly type `ty`
    pub fn with_constant_typed(self, name: &str, ty: TypeInfo) -> Self {
        self.filter(|info| {
            info.constant(name)
                .map_or(false, |constant| constant.type_info() == ty)
        })
    }

    /// Keep types with a constant named `name` of type `V`
    pub fn with_constant_of<V: Reflect>(self, name: &str) -> Self {
        self.with_constant_typed(name, TypeInfo::of::<V>())
    }

    /// Keep types that inherit from `base`
    pub fn inherits_from(self, base: TypeInfo) -> Self {
        self.filter(|info| info.inherits(base))
    }

    /// Keep types that inherit from `B`
    pub fn inherits_from_type<B: Reflect>(self) -> Self {
        self.inherits_from(TypeInfo::of::<B>())
    }

    /// Keep types convertible to `target`
    pub fn convertible_to(self, target: TypeInfo) -> Self {
        self.filter(|info| info.is_convertible(target))
    }

    /// Matching types; every registered type if no filter ran
    pub fn types(&self) -> HashSet<TypeInfo> {
        match &self.types {
            Some(types) => types.clone(),
            None => self.registry.types.values().copied().collect(),
        }
    }

    /// Consume the query, releasing the lock
    pub fn into_types(self) -> HashSet<TypeInfo> {
        match self.types {
            Some(types) => types,
            None => self.registry.types.values().copied().collect(),
        }
    }

    fn filter(mut self, predicate: impl Fn(&TypeInfo) -> bool) -> Self {
        match &mut self.types {
            None => {
                let seeded = self
                    .registry
                    .types
                    .values()
                    .filter(|info| predicate(info))
                    .copied()
                    .collect();
                self.types = Some(seeded);
            }
            Some(types) => types.retain(|info| predicate(info)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TypeDatabase;
    use crate::descriptor::Descriptor;

    #[derive(Clone, Debug, PartialEq)]
    struct Serializable;

    impl Reflect for Serializable {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("query_test::Serializable").copyable();
        }
    }

    #[derive(Clone, Default)]
    struct Figure;
    impl Reflect for Figure {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("query_test::Figure").copyable();
        }
    }

    #[derive(Clone, Default)]
    struct Circle {
        base: Figure,
    }
    impl Reflect for Circle {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("query_test::Circle")
                .copyable()
                .parent(|c: &Circle| &c.base, |c: &mut Circle| &mut c.base);
        }
    }

    struct Counter;
    impl Reflect for Counter {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("query_test::Counter");
        }
    }

    fn populated() -> TypeDatabase {
        let db = TypeDatabase::new();
        db.reflect::<Figure>().attribute(Serializable).constant("SIDES", 0i32);
        db.reflect::<Circle>().constant("SIDES", 1u8);
        db.reflect::<Counter>()
            .attribute(Serializable)
            .constant("SIDES", 3i32)
            .conversion(|_: &Counter| 3i64);
        db
    }

    #[test]
    fn test_unfiltered_query_returns_everything() {
        let db = populated();
        assert_eq!(db.query().types().len(), 3);
    }

    #[test]
    fn test_filters_intersect_in_any_order() {
        let db = populated();
        let a = db
            .query()
            .with_attribute::<Serializable>()
            .with_constant_of::<i32>("SIDES")
            .into_types();
        let b = db
            .query()
            .with_constant_of::<i32>("SIDES")
            .with_attribute::<Serializable>()
            .into_types();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(!a.contains(&TypeInfo::of::<Circle>()));
    }

    #[test]
    fn test_inheritance_and_conversion_filters() {
        let db = populated();
        let derived = db.query().inherits_from_type::<Figure>().into_types();
        assert!(derived.contains(&TypeInfo::of::<Circle>()));
        assert!(!derived.contains(&TypeInfo::of::<Figure>()));
        assert!(!derived.contains(&TypeInfo::of::<Counter>()));

        let convertible = db.query().convertible_to(TypeInfo::of::<i64>()).into_types();
        assert_eq!(convertible.len(), 1);
        assert!(convertible.contains(&TypeInfo::of::<Counter>()));
    }

    #[test]
    fn test_missing_attribute_yields_empty_set() {
        let db = populated();
        assert!(db.query().with_attribute_named("nope").types().is_empty());
        assert!(db.query().with_constant("SIDES").with_attribute_named("nope").types().is_empty());
    }
}
