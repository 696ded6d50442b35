//! Deferred type references
//!
//! A [`TypeHandle`] stores the function that produces a type's record rather
//! than the record itself, so two types can refer to each other (a field of
//! one is a parent of the other, an argument type of a function, ...) without
//! either record having to exist first.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ptr;

use crate::descriptor::Reflect;
use crate::type_data::TypeData;
use crate::type_info::TypeInfo;

/// Lazily resolved reference to a type record
#[derive(Clone, Copy)]
pub struct TypeHandle {
    resolve: fn() -> &'static TypeData,
}

impl TypeHandle {
    /// Handle to the record of `T`
    #[inline]
    pub fn of<T: Reflect>() -> Self {
        Self {
            resolve: TypeData::of::<T>,
        }
    }

    /// Resolve the handle, creating the record if needed
    #[inline]
    pub fn resolve(&self) -> TypeInfo {
        TypeInfo::from_data(self.data())
    }

    #[inline]
    pub(crate) fn data(&self) -> &'static TypeData {
        (self.resolve)()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.data(), other.data())
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.data(), state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.data().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mutually referencing types: each names the other only through a handle.
    struct Node {
        _owner: Option<Box<Owner>>,
    }
    struct Owner {
        _nodes: Vec<Node>,
    }

    impl Reflect for Node {}
    impl Reflect for Owner {}

    #[test]
    fn test_handles_resolve_to_one_record() {
        let a = TypeHandle::of::<Node>();
        let b = TypeHandle::of::<Node>();
        assert_eq!(a, b);
        assert_ne!(a, TypeHandle::of::<Owner>());
        assert_eq!(a.resolve(), TypeInfo::of::<Node>());
    }
}
