//! TypeInfo - the public handle to a type record

use core::alloc::Layout;
use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ptr;
use std::sync::Arc;

use crate::any::Any;
use crate::attribute::Attributes;
use crate::database::TypeDatabase;
use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::factory::TypeFactory;
use crate::member::{describe_args, ConstantInfo, FunctionInfo, Overload, PropertyInfo};
use crate::type_data::{TypeData, TypeFlags};

/// Copyable handle to a type record, or an invalid handle
///
/// Handles compare equal when they refer to the same record.
#[derive(Clone, Copy, Default)]
pub struct TypeInfo {
    data: Option<&'static TypeData>,
}

impl TypeInfo {
    /// The record of `T`; never requires registration
    #[inline]
    pub fn of<T: Reflect>() -> Self {
        Self::from_data(TypeData::of::<T>())
    }

    /// Look up a registered type by name; invalid if absent
    pub fn get(name: &str) -> Self {
        TypeDatabase::instance().get(name)
    }

    /// Register `T` in the global database and start declaring members
    ///
    /// The returned factory holds the database's exclusive lock until it is
    /// dropped. Looking up types from the same thread before then deadlocks.
    pub fn reflect<T: Reflect>() -> TypeFactory<'static, T> {
        TypeDatabase::instance().reflect::<T>()
    }

    /// Unregister `name` from the global database and reset its record
    pub fn reset(name: &str) -> bool {
        TypeDatabase::instance().reset(name)
    }

    #[inline]
    pub(crate) fn from_data(data: &'static TypeData) -> Self {
        Self { data: Some(data) }
    }

    #[inline]
    pub(crate) fn data(&self) -> Option<&'static TypeData> {
        self.data
    }

    /// Check if this refers to a record
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    /// Type name; empty for an invalid handle
    pub fn name(&self) -> &'static str {
        self.data.map_or("", |data| data.name())
    }

    /// Rust type id
    pub fn type_id(&self) -> Option<TypeId> {
        self.data.map(TypeData::type_id)
    }

    /// Memory layout
    pub fn layout(&self) -> Option<Layout> {
        self.data.map(TypeData::layout)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.layout().map_or(0, |layout| layout.size())
    }

    /// Alignment in bytes
    pub fn align(&self) -> usize {
        self.layout().map_or(0, |layout| layout.align())
    }

    /// Trait flags
    pub fn flags(&self) -> TypeFlags {
        self.data.map_or(TypeFlags::empty(), TypeData::flags)
    }

    /// The unit type `()`
    pub fn is_void(&self) -> bool {
        self.flags().contains(TypeFlags::VOID)
    }

    /// Zero-sized
    pub fn is_empty(&self) -> bool {
        self.flags().contains(TypeFlags::EMPTY)
    }

    /// C-like enum over an integer type
    pub fn is_enum(&self) -> bool {
        self.flags().contains(TypeFlags::ENUM)
    }

    /// Signed integer
    pub fn is_signed(&self) -> bool {
        self.flags().contains(TypeFlags::SIGNED)
    }

    /// Unsigned integer
    pub fn is_unsigned(&self) -> bool {
        self.flags().contains(TypeFlags::UNSIGNED)
    }

    /// Floating point
    pub fn is_floating(&self) -> bool {
        self.flags().contains(TypeFlags::FLOATING)
    }

    /// Signed, unsigned or floating point
    pub fn is_arithmetic(&self) -> bool {
        self.flags()
            .intersects(TypeFlags::SIGNED | TypeFlags::UNSIGNED | TypeFlags::FLOATING)
    }

    /// Values can be copied
    pub fn is_copyable(&self) -> bool {
        self.data.map_or(false, |data| data.vtable.clone.is_some())
    }

    /// Values support equality
    pub fn is_comparable(&self) -> bool {
        self.data.map_or(false, |data| data.vtable.eq.is_some())
    }

    /// Values support ordering
    pub fn is_ordered(&self) -> bool {
        self.data.map_or(false, |data| data.vtable.cmp.is_some())
    }

    /// Viewable as a range
    pub fn has_range(&self) -> bool {
        self.data.map_or(false, |data| data.shapes.range.is_some())
    }

    /// Viewable as a key-value table
    pub fn has_table(&self) -> bool {
        self.data.map_or(false, |data| data.shapes.table.is_some())
    }

    /// Viewable as a tuple
    pub fn has_tuple(&self) -> bool {
        self.data.map_or(false, |data| data.shapes.tuple.is_some())
    }

    /// Viewable as a string
    pub fn has_string(&self) -> bool {
        self.data.map_or(false, |data| data.shapes.string.is_some())
    }

    /// Underlying integer type of an enum; invalid otherwise
    pub fn underlying_type(&self) -> TypeInfo {
        self.data
            .and_then(|data| data.enum_data.as_ref())
            .map(|enum_data| enum_data.underlying.resolve())
            .unwrap_or_default()
    }

    /// Item type of a range; invalid otherwise
    pub fn range_value_type(&self) -> TypeInfo {
        self.data
            .and_then(|data| data.shapes.range.as_ref())
            .map(|range| range.item())
            .unwrap_or_default()
    }

    /// Transitive check over declared parents
    pub fn inherits(&self, base: TypeInfo) -> bool {
        match (self.data, base.data) {
            (Some(data), Some(base)) => data.inherits(base),
            _ => false,
        }
    }

    /// Transitive check against `B`
    pub fn inherits_from<B: Reflect>(&self) -> bool {
        self.inherits(TypeInfo::of::<B>())
    }

    /// Whether [`Any::conv`] can produce `target` from this type
    pub fn is_convertible(&self, target: TypeInfo) -> bool {
        match (self.data, target.data) {
            (Some(data), Some(target_data)) => {
                (ptr::eq(data, target_data) && data.vtable.clone.is_some())
                    || data.find_conversion(target_data).is_some()
                    || (self.inherits(target) && target_data.vtable.clone.is_some())
            }
            _ => false,
        }
    }

    /// Directly declared parents
    pub fn parents(&self) -> Vec<TypeInfo> {
        self.data.map_or_else(Vec::new, |data| {
            data.parents()
                .iter()
                .map(|parent| parent.parent.resolve())
                .collect()
        })
    }

    /// Conversion targets, in registration order
    pub fn conversions(&self) -> Vec<TypeInfo> {
        self.data.map_or_else(Vec::new, |data| {
            data.members()
                .conversions
                .iter()
                .map(|conversion| conversion.target.resolve())
                .collect()
        })
    }

    /// Registered constructors
    pub fn constructors(&self) -> Vec<Overload> {
        self.data
            .map_or_else(Vec::new, |data| data.members().constructors.clone())
    }

    /// Construct a value with the first constructor accepting `args`
    pub fn construct(&self, args: &mut [Any<'_>]) -> Result<Any<'static>> {
        let data = self.require("construct")?;
        let constructor = data
            .members()
            .constructors
            .iter()
            .find(|ctor| ctor.accepts(args))
            .cloned();
        match constructor {
            Some(ctor) => ctor.invoke(args),
            None => Err(Error::new(
                ErrorKind::InvalidFunction,
                format!(
                    "no constructor of '{}' accepts ({})",
                    data.name(),
                    describe_args(args)
                ),
            )),
        }
    }

    /// Named constant
    pub fn constant(&self, name: &str) -> Option<ConstantInfo> {
        self.data?.members().constants.get(name).cloned()
    }

    /// All constants, sorted by name
    pub fn constants(&self) -> Vec<ConstantInfo> {
        self.data.map_or_else(Vec::new, |data| {
            data.members().constants.values().cloned().collect()
        })
    }

    /// Named property
    pub fn property(&self, name: &str) -> Option<PropertyInfo> {
        self.data?.members().properties.get(name).cloned()
    }

    /// All properties, sorted by name
    pub fn properties(&self) -> Vec<PropertyInfo> {
        self.data.map_or_else(Vec::new, |data| {
            data.members().properties.values().cloned().collect()
        })
    }

    /// Named function with all its overloads
    pub fn function(&self, name: &str) -> Option<FunctionInfo> {
        let members = self.data?.members();
        let overloads = members.functions.get(name)?;
        Some(FunctionInfo::new(name, overloads.clone()))
    }

    /// All functions, sorted by name
    pub fn functions(&self) -> Vec<FunctionInfo> {
        self.data.map_or_else(Vec::new, |data| {
            data.members()
                .functions
                .iter()
                .map(|(name, overloads)| FunctionInfo::new(name, overloads.clone()))
                .collect()
        })
    }

    /// Call the named function with the first overload accepting `args`
    pub fn invoke(&self, name: &str, args: &mut [Any<'_>]) -> Result<Any<'static>> {
        let data = self.require("invoke")?;
        match self.function(name) {
            Some(function) => function.invoke(args),
            None => Err(Error::new(
                ErrorKind::InvalidFunction,
                format!("'{}' has no function '{}'", data.name(), name),
            )),
        }
    }

    /// Typed attribute of the type itself
    pub fn get_attribute<A: Reflect>(&self) -> Option<Arc<A>> {
        self.data?.members().attributes.get::<A>()
    }

    /// Check for an attribute of the type itself
    pub fn has_attribute<A: Reflect>(&self) -> bool {
        self.data
            .map_or(false, |data| data.members().attributes.contains::<A>())
    }

    /// Check for an attribute by attribute type name
    pub fn has_attribute_named(&self, name: &str) -> bool {
        self.data
            .map_or(false, |data| data.members().attributes.contains_named(name))
    }

    /// Snapshot of the type's own attributes
    pub fn attributes(&self) -> Attributes {
        self.data
            .map_or_else(Attributes::new, |data| data.members().attributes.clone())
    }

    fn require(&self, operation: &str) -> Result<&'static TypeData> {
        self.data.ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidType,
                format!("cannot {} through an invalid type", operation),
            )
        })
    }
}

/// Name of `T`'s record
pub fn type_name<T: Reflect>() -> &'static str {
    TypeInfo::of::<T>().name()
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        match (self.data, other.data) {
            (Some(a), Some(b)) => ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.map(|data| data as *const TypeData).hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            Some(data) => write!(f, "TypeInfo({})", data.name()),
            None => write!(f, "TypeInfo(invalid)"),
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[derive(Clone, Debug, PartialEq)]
    struct Celsius(f32);

    impl Reflect for Celsius {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("test::Celsius")
                .copyable()
                .comparable()
                .debuggable()
                .constructor(Celsius)
                .constructor(|kelvin: f64| Celsius((kelvin - 273.15) as f32));
        }
    }

    #[test]
    fn test_handle_identity() {
        assert_eq!(TypeInfo::of::<Celsius>(), TypeInfo::of::<Celsius>());
        assert_ne!(TypeInfo::of::<Celsius>(), TypeInfo::of::<f32>());
        assert_eq!(type_name::<Celsius>(), "test::Celsius");
        assert_eq!(TypeInfo::default(), TypeInfo::default());
        assert!(!TypeInfo::default().is_valid());
        assert_eq!(TypeInfo::default().name(), "");
    }

    #[test]
    fn test_construct_picks_matching_overload() {
        let info = TypeInfo::of::<Celsius>();
        let from_f32 = info.construct(&mut [Any::new(21.5f32)]).unwrap();
        assert_eq!(from_f32.get::<Celsius>(), Some(&Celsius(21.5)));

        let from_f64 = info.construct(&mut [Any::new(273.15f64)]).unwrap();
        assert_eq!(from_f64.get::<Celsius>(), Some(&Celsius(0.0)));

        let err = info.construct(&mut [Any::new("hot")]).unwrap_err();
        assert!(err.is(ErrorKind::InvalidFunction));
        assert!(TypeInfo::default().construct(&mut []).unwrap_err().is(ErrorKind::InvalidType));
    }

    #[test]
    fn test_flags() {
        assert!(TypeInfo::of::<i8>().is_signed());
        assert!(TypeInfo::of::<usize>().is_arithmetic());
        assert!(!TypeInfo::of::<bool>().is_arithmetic());
        assert!(TypeInfo::of::<()>().is_void());
        assert!(TypeInfo::of::<Vec<u8>>().has_range());
        assert_eq!(TypeInfo::of::<Vec<u8>>().range_value_type(), TypeInfo::of::<u8>());
        assert!(TypeInfo::of::<String>().has_string());
    }
}
