//! Type records - one per reflected Rust type
//!
//! A record is created lazily the first time anything asks for it and lives
//! for the rest of the process. The immutable half (layout, flags, value
//! vtable, shapes) is fixed when the record is built; the mutable half
//! ([`Members`]) is filled in by [`TypeFactory`](crate::TypeFactory) and
//! restored to its descriptor defaults by a reset.

use core::alloc::Layout;
use core::any::TypeId;
use core::cmp::Ordering;
use core::fmt;
use core::ptr;
use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::any::Any;
use crate::descriptor::{Descriptor, Reflect};
use crate::member::{Conversion, Members, ParentCast};
use crate::shape::Shapes;
use crate::TypeHandle;

bitflags! {
    /// Trait flags of a reflected type
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        /// The unit type
        const VOID = 1 << 0;
        /// Zero-sized type
        const EMPTY = 1 << 1;
        /// C-like enum with an underlying integer type
        const ENUM = 1 << 2;
        /// Signed integer
        const SIGNED = 1 << 3;
        /// Unsigned integer
        const UNSIGNED = 1 << 4;
        /// Floating point number
        const FLOATING = 1 << 5;
    }
}

pub(crate) type DropFn = unsafe fn(*mut u8);
pub(crate) type CloneFn = unsafe fn(*const u8, *mut u8);
pub(crate) type EqFn = unsafe fn(*const u8, *const u8) -> bool;
pub(crate) type CmpFn = unsafe fn(*const u8, *const u8) -> Option<Ordering>;
pub(crate) type DebugFn = unsafe fn(*const u8, &mut fmt::Formatter<'_>) -> fmt::Result;

/// Converts the value behind a pointer into an owned value of another type
pub(crate) type ConvertFn = Arc<dyn Fn(*const u8) -> Any<'static> + Send + Sync>;

/// Value operations synthesized from the concrete type
#[derive(Clone, Copy)]
pub(crate) struct ValueVTable {
    pub drop: DropFn,
    /// Writes a copy of `src` into uninitialized `dst`
    pub clone: Option<CloneFn>,
    pub eq: Option<EqFn>,
    pub cmp: Option<CmpFn>,
    pub debug: Option<DebugFn>,
}

impl ValueVTable {
    pub(crate) fn of<T>() -> Self {
        Self {
            drop: drop_thunk::<T>,
            clone: None,
            eq: None,
            cmp: None,
            debug: None,
        }
    }
}

unsafe fn drop_thunk<T>(value: *mut u8) {
    ptr::drop_in_place(value.cast::<T>());
}

/// Enum metadata: the underlying integer type and the two-way mapping
pub(crate) struct EnumData {
    pub underlying: TypeHandle,
    pub to_underlying: ConvertFn,
    /// Checked conversion from an integer; `None` if out of range or unnamed
    pub from_integer: fn(i128) -> Option<Any<'static>>,
}

/// The metadata record of one reflected type
pub struct TypeData {
    pub(crate) type_id: TypeId,
    pub(crate) name: Box<str>,
    pub(crate) layout: Layout,
    pub(crate) flags: TypeFlags,
    pub(crate) vtable: ValueVTable,
    pub(crate) shapes: Shapes,
    pub(crate) enum_data: Option<EnumData>,
    members: RwLock<Members>,
    fresh: fn() -> Members,
}

/// Process-wide map from Rust type to its leaked record
static RECORDS: Lazy<RwLock<HashMap<TypeId, &'static TypeData>>> = Lazy::new(Default::default);

impl TypeData {
    /// Get (creating on first use) the record for `T`
    pub fn of<T: Reflect>() -> &'static TypeData {
        let type_id = TypeId::of::<T>();
        if let Some(data) = RECORDS.read().get(&type_id) {
            return data;
        }

        // Built outside the lock: describing a type may resolve others.
        let built = Descriptor::<T>::build();
        let mut records = RECORDS.write();
        *records
            .entry(type_id)
            .or_insert_with(|| Box::leak(Box::new(built)))
    }

    pub(crate) fn from_parts(
        descriptor_parts: DescriptorParts,
        fresh: fn() -> Members,
    ) -> Self {
        let DescriptorParts {
            type_id,
            name,
            layout,
            flags,
            vtable,
            shapes,
            enum_data,
            members,
        } = descriptor_parts;
        Self {
            type_id,
            name,
            layout,
            flags,
            vtable,
            shapes,
            enum_data,
            members: RwLock::new(members),
            fresh,
        }
    }

    /// Registered or generated name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The Rust type id
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Memory layout of a value
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Trait flags
    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub(crate) fn members(&self) -> RwLockReadGuard<'_, Members> {
        self.members.read()
    }

    pub(crate) fn members_mut(&self) -> RwLockWriteGuard<'_, Members> {
        self.members.write()
    }

    /// Restore members to the state the descriptor produced
    pub(crate) fn reset(&self) {
        let fresh = (self.fresh)();
        *self.members.write() = fresh;
    }

    /// Declared parents, copied out so no lock is held while casting
    pub(crate) fn parents(&self) -> Vec<ParentCast> {
        self.members.read().parents.clone()
    }

    /// Find the conversion thunk to `target`; later registrations win
    pub(crate) fn find_conversion(&self, target: &'static TypeData) -> Option<ConvertFn> {
        let conversions: Vec<Conversion> = self.members.read().conversions.clone();
        conversions
            .iter()
            .rev()
            .find(|conversion| ptr::eq(conversion.target.data(), target))
            .map(|conversion| conversion.convert.clone())
    }

    /// Depth-first check over declared parents
    pub(crate) fn inherits(&'static self, base: &'static TypeData) -> bool {
        self.inherits_at(base, 0)
    }

    fn inherits_at(&'static self, base: &'static TypeData, depth: usize) -> bool {
        if depth > MAX_PARENT_DEPTH {
            return false;
        }
        self.parents().iter().any(|parent| {
            let data = parent.parent.data();
            ptr::eq(data, base) || data.inherits_at(base, depth + 1)
        })
    }
}

impl fmt::Debug for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeData")
            .field("name", &self.name)
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .field("flags", &self.flags)
            .finish()
    }
}

/// Parent chains deeper than this are treated as malformed
pub(crate) const MAX_PARENT_DEPTH: usize = 64;

/// Everything a descriptor hands over when a record is built
pub(crate) struct DescriptorParts {
    pub type_id: TypeId,
    pub name: Box<str>,
    pub layout: Layout,
    pub flags: TypeFlags,
    pub vtable: ValueVTable,
    pub shapes: Shapes,
    pub enum_data: Option<EnumData>,
    pub members: Members,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    impl Reflect for Opaque {}

    #[test]
    fn test_record_is_singleton() {
        let a = TypeData::of::<Opaque>();
        let b = TypeData::of::<Opaque>();
        assert!(ptr::eq(a, b));
        assert!(a.flags().contains(TypeFlags::EMPTY));
        assert!(a.name().ends_with("Opaque"));
    }

    #[test]
    fn test_primitive_flags() {
        assert!(TypeData::of::<i32>().flags().contains(TypeFlags::SIGNED));
        assert!(TypeData::of::<u8>().flags().contains(TypeFlags::UNSIGNED));
        assert!(TypeData::of::<f64>().flags().contains(TypeFlags::FLOATING));
        assert!(TypeData::of::<()>().flags().contains(TypeFlags::VOID));
    }
}
