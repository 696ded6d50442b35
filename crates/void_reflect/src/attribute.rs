//! Attributes - arbitrary reflected values attached to types and members

use core::any::Any as StdAny;
use core::fmt;
use core::ptr::NonNull;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::any::Any;
use crate::descriptor::Reflect;
use crate::handle::TypeHandle;
use crate::type_info::TypeInfo;

/// One attribute value, shared between every reader
#[derive(Clone)]
pub struct AttributeValue {
    ty: TypeHandle,
    value: Arc<dyn StdAny + Send + Sync>,
}

impl AttributeValue {
    /// Wrap an attribute value
    pub fn new<A: Reflect>(value: A) -> Self {
        Self {
            ty: TypeHandle::of::<A>(),
            value: Arc::new(value),
        }
    }

    /// Type of the attribute
    pub fn type_info(&self) -> TypeInfo {
        self.ty.resolve()
    }

    /// Typed access
    pub fn downcast<A: Reflect>(&self) -> Option<Arc<A>> {
        self.value.clone().downcast::<A>().ok()
    }

    /// Erased const reference to the attribute
    pub fn value(&self) -> Any<'_> {
        let ptr = NonNull::from(&*self.value).cast::<u8>();
        // SAFETY: the pointee is an `A` described by `ty` and outlives the borrow of self.
        unsafe { Any::from_parts(self.ty.data(), ptr, true) }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttributeValue").field(&self.value()).finish()
    }
}

/// Attribute table keyed by the attribute's type name
#[derive(Clone, Default)]
pub struct Attributes {
    entries: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute, returning its key
    pub fn insert<A: Reflect>(&mut self, value: A) -> String {
        let name = TypeInfo::of::<A>().name().to_string();
        self.entries.insert(name.clone(), AttributeValue::new(value));
        name
    }

    /// Typed lookup
    pub fn get<A: Reflect>(&self) -> Option<Arc<A>> {
        self.entries
            .get(TypeInfo::of::<A>().name())
            .and_then(AttributeValue::downcast::<A>)
    }

    /// Lookup by attribute type name
    pub fn get_named(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    /// Check for an attribute by type
    pub fn contains<A: Reflect>(&self) -> bool {
        self.entries.contains_key(TypeInfo::of::<A>().name())
    }

    /// Check for an attribute by type name
    pub fn contains_named(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Attribute type names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over all attributes
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Doc(&'static str);

    impl Reflect for Doc {
        fn describe(d: &mut crate::Descriptor<Self>) {
            d.name("test::Doc").copyable().comparable().debuggable();
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut attributes = Attributes::new();
        assert_eq!(attributes.insert(Doc("hello")), "test::Doc");
        assert!(attributes.contains::<Doc>());
        assert_eq!(*attributes.get::<Doc>().unwrap(), Doc("hello"));
        assert!(attributes.get::<i32>().is_none());

        let erased = attributes.get_named("test::Doc").unwrap();
        assert_eq!(erased.value().get::<Doc>(), Some(&Doc("hello")));
    }

    #[test]
    fn test_replace_keeps_one_entry() {
        let mut attributes = Attributes::new();
        attributes.insert(Doc("a"));
        attributes.insert(Doc("b"));
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get::<Doc>().unwrap().0, "b");
    }
}
