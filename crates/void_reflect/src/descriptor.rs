//! Reflect trait and the per-type descriptor
//!
//! [`Reflect::describe`] runs once when a type's record is first built and
//! again whenever the record is reset. Everything it declares becomes the
//! record's default state. A descriptor only stores [`TypeHandle`]s to other
//! types; describing `T` must never resolve `T`'s own record.

use core::alloc::Layout;
use core::any::TypeId;
use core::fmt;
use core::marker::PhantomData;
use core::mem;

use num_traits::AsPrimitive;

use crate::any::Any;
use crate::function::IntoFunction;
use crate::member::{Conversion, Members, ParentCast};
use crate::shape::range::{BidirectionalRange, RandomAccessRange, RangeLike, RangeShape};
use crate::shape::string::{StringLike, StringShape};
use crate::shape::table::{TableLike, TableShape};
use crate::shape::tuple::{TupleShape, TupleSlot};
use crate::shape::Shapes;
use crate::type_data::{
    CloneFn, CmpFn, DebugFn, DescriptorParts, EnumData, EqFn, TypeData, TypeFlags, ValueVTable,
};
use crate::TypeHandle;

/// A type that can take part in reflection
///
/// The default description gives the type a record with its Rust name,
/// layout and drop glue only. Override [`describe`](Reflect::describe) to
/// declare capabilities:
///
/// ```ignore
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// impl Reflect for Point {
///     fn describe(d: &mut Descriptor<Self>) {
///         d.name("Point")
///             .copyable()
///             .comparable()
///             .debuggable()
///             .default_constructible()
///             .field(|p: &Point| &p.x, |p: &mut Point| &mut p.x)
///             .field(|p: &Point| &p.y, |p: &mut Point| &mut p.y);
///     }
/// }
/// ```
pub trait Reflect: Sized + Send + Sync + 'static {
    /// Declare the capabilities of this type
    fn describe(descriptor: &mut Descriptor<Self>) {
        let _ = descriptor;
    }
}

/// Builder for the default state of a type record
pub struct Descriptor<T: Reflect> {
    name: Option<String>,
    flags: TypeFlags,
    vtable: ValueVTable,
    shapes: Shapes,
    fields: Vec<TupleSlot>,
    enum_data: Option<EnumData>,
    members: Members,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> Descriptor<T> {
    fn new() -> Self {
        let mut flags = TypeFlags::empty();
        if mem::size_of::<T>() == 0 {
            flags |= TypeFlags::EMPTY;
        }
        if TypeId::of::<T>() == TypeId::of::<()>() {
            flags |= TypeFlags::VOID;
        }
        Self {
            name: None,
            flags,
            vtable: ValueVTable::of::<T>(),
            shapes: Shapes::default(),
            fields: Vec::new(),
            enum_data: None,
            members: Members::default(),
            _marker: PhantomData,
        }
    }

    fn described() -> Self {
        let mut descriptor = Self::new();
        T::describe(&mut descriptor);
        descriptor
    }

    /// Build the record for `T`
    pub(crate) fn build() -> TypeData {
        let descriptor = Self::described();
        let name = descriptor
            .name
            .unwrap_or_else(|| core::any::type_name::<T>().to_string());
        let tuple = if descriptor.fields.is_empty() {
            None
        } else {
            Some(TupleShape::new(descriptor.fields))
        };
        let shapes = Shapes {
            tuple,
            ..descriptor.shapes
        };
        log::debug!("Building type record '{}'", name);
        TypeData::from_parts(
            DescriptorParts {
                type_id: TypeId::of::<T>(),
                name: name.into_boxed_str(),
                layout: Layout::new::<T>(),
                flags: descriptor.flags,
                vtable: descriptor.vtable,
                shapes,
                enum_data: descriptor.enum_data,
                members: descriptor.members,
            },
            Self::fresh_members,
        )
    }

    fn fresh_members() -> Members {
        Self::described().members
    }

    /// Set the registered name
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add trait flags
    pub fn flags(&mut self, flags: TypeFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    /// Values can be copied; also registers the `&T` copy constructor
    pub fn copyable(&mut self) -> &mut Self
    where
        T: Clone,
    {
        self.vtable.clone = Some(clone_thunk::<T>);
        self.constructor(|value: &T| value.clone())
    }

    /// Values can be compared for equality
    pub fn comparable(&mut self) -> &mut Self
    where
        T: PartialEq,
    {
        self.vtable.eq = Some(eq_thunk::<T>);
        self
    }

    /// Values have an ordering
    pub fn ordered(&mut self) -> &mut Self
    where
        T: PartialOrd,
    {
        self.vtable.cmp = Some(cmp_thunk::<T>);
        self
    }

    /// Values can be debug formatted
    pub fn debuggable(&mut self) -> &mut Self
    where
        T: fmt::Debug,
    {
        self.vtable.debug = Some(debug_thunk::<T>);
        self
    }

    /// Registers the zero-argument constructor
    pub fn default_constructible(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Register a constructor
    pub fn constructor<M, F>(&mut self, constructor: F) -> &mut Self
    where
        F: IntoFunction<M, Output = T>,
    {
        self.members.constructors.push(constructor.into_overload());
        self
    }

    /// Register a named function
    pub fn function<M, F>(&mut self, name: &str, function: F) -> &mut Self
    where
        F: IntoFunction<M>,
    {
        self.members.add_function(name, function.into_overload());
        self
    }

    /// Declare `B` as a parent reachable through the given projections
    pub fn parent<B, U, M>(&mut self, upcast: U, upcast_mut: M) -> &mut Self
    where
        B: Reflect,
        U: Fn(&T) -> &B + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        self.members.parents.push(ParentCast::new::<T, B, U, M>(upcast, upcast_mut));
        self
    }

    /// Declare a value conversion to `U`
    pub fn conversion<U, F>(&mut self, convert: F) -> &mut Self
    where
        U: Reflect,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.members.conversions.push(Conversion::new::<T, U, F>(convert));
        self
    }

    /// Declare a primitive `as` conversion to `U`
    pub fn convert_as<U>(&mut self) -> &mut Self
    where
        T: AsPrimitive<U>,
        U: Reflect + Copy,
    {
        self.conversion(|value: &T| -> U { (*value).as_() })
    }

    /// Mark `T` as a C-like enum over the integer type `U`
    pub fn enumeration<U>(&mut self) -> &mut Self
    where
        T: Copy + Into<U> + TryFrom<U>,
        U: Reflect + TryFrom<i128>,
    {
        self.flags |= TypeFlags::ENUM;
        let to_underlying = Conversion::new(|value: &T| -> U { (*value).into() });
        self.enum_data = Some(EnumData {
            underlying: TypeHandle::of::<U>(),
            to_underlying: to_underlying.convert.clone(),
            from_integer: enum_from_integer::<T, U>,
        });
        self.members.conversions.push(to_underlying);
        self
    }

    /// Expose `T` as a forward range
    pub fn range(&mut self) -> &mut Self
    where
        T: RangeLike,
    {
        self.shapes.range = Some(RangeShape::forward::<T>());
        self
    }

    /// Expose `T` as a bidirectional range
    pub fn bidirectional_range(&mut self) -> &mut Self
    where
        T: BidirectionalRange,
    {
        self.shapes.range = Some(RangeShape::bidirectional::<T>());
        self
    }

    /// Expose `T` as a random access range
    pub fn random_access_range(&mut self) -> &mut Self
    where
        T: RandomAccessRange,
    {
        self.shapes.range = Some(RangeShape::random_access::<T>());
        self
    }

    /// Expose `T` as a key/value table
    pub fn table(&mut self) -> &mut Self
    where
        T: TableLike,
    {
        self.shapes.table = Some(TableShape::of::<T>());
        self
    }

    /// Expose `T` as a string
    pub fn string(&mut self) -> &mut Self
    where
        T: StringLike,
    {
        self.shapes.string = Some(StringShape::of::<T>());
        self
    }

    /// Append a tuple slot; slots are indexed in declaration order
    pub fn field<F, G, M>(&mut self, get: G, get_mut: M) -> &mut Self
    where
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.fields.push(TupleSlot::new::<T, F, G, M>(get, get_mut));
        self
    }

    pub(crate) fn set_clone(&mut self, clone: CloneFn) -> &mut Self {
        self.vtable.clone = Some(clone);
        self
    }

    pub(crate) fn set_eq(&mut self, eq: EqFn) -> &mut Self {
        self.vtable.eq = Some(eq);
        self
    }

    pub(crate) fn set_cmp(&mut self, cmp: CmpFn) -> &mut Self {
        self.vtable.cmp = Some(cmp);
        self
    }

    pub(crate) fn set_debug(&mut self, debug: DebugFn) -> &mut Self {
        self.vtable.debug = Some(debug);
        self
    }
}

fn enum_from_integer<T, U>(raw: i128) -> Option<Any<'static>>
where
    T: Reflect + TryFrom<U>,
    U: TryFrom<i128>,
{
    let raw = U::try_from(raw).ok()?;
    T::try_from(raw).ok().map(Any::new)
}

unsafe fn clone_thunk<T: Clone>(src: *const u8, dst: *mut u8) {
    dst.cast::<T>().write((*src.cast::<T>()).clone());
}

unsafe fn eq_thunk<T: PartialEq>(a: *const u8, b: *const u8) -> bool {
    *a.cast::<T>() == *b.cast::<T>()
}

unsafe fn cmp_thunk<T: PartialOrd>(a: *const u8, b: *const u8) -> Option<core::cmp::Ordering> {
    (*a.cast::<T>()).partial_cmp(&*b.cast::<T>())
}

unsafe fn debug_thunk<T: fmt::Debug>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&*value.cast::<T>(), f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeInfo;

    #[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
    struct Meters(f64);

    impl Reflect for Meters {
        fn describe(d: &mut Descriptor<Self>) {
            d.name("test::Meters")
                .copyable()
                .comparable()
                .ordered()
                .debuggable()
                .default_constructible()
                .conversion(|m: &Meters| m.0)
                .field(|m: &Meters| &m.0, |m: &mut Meters| &mut m.0);
        }
    }

    #[test]
    fn test_described_capabilities() {
        let info = TypeInfo::of::<Meters>();
        assert_eq!(info.name(), "test::Meters");
        assert!(info.is_copyable());
        assert!(info.is_comparable());
        assert!(info.is_ordered());
        assert!(info.has_tuple());
        assert!(!info.has_range());
        assert!(info.is_convertible(TypeInfo::of::<f64>()));
        assert_eq!(info.constructors().len(), 2);
    }

    #[test]
    fn test_default_name_is_rust_name() {
        struct Unnamed;
        impl Reflect for Unnamed {}

        let info = TypeInfo::of::<Unnamed>();
        assert!(info.name().ends_with("Unnamed"));
        assert!(info.is_empty());
        assert!(!info.is_copyable());
    }
}
