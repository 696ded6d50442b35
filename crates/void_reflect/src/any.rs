//! Any - type-erased value container
//!
//! An [`Any`] is empty, owns a value, or references one. Owned values that
//! fit in three machine words (with at most word alignment) are stored
//! inline; larger ones go to the heap. References borrow for `'a` and carry
//! their const-ness: a const reference never hands out a mutable pointer.
//!
//! Every operation is driven by the value's [`TypeInfo`] record: copying
//! uses the record's clone thunk (or a registered `&T` constructor),
//! equality and ordering use its comparison thunks, casting walks the
//! declared parents and conversion uses the registered conversions.

use core::alloc::Layout;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};
use std::alloc;

use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::shape::{AnyRange, AnyTable, AnyTuple};
use crate::type_data::{TypeData, MAX_PARENT_DEPTH};
use crate::type_info::TypeInfo;

type InlineBuf = MaybeUninit<[usize; 3]>;

#[inline]
fn fits_inline(layout: Layout) -> bool {
    layout.size() <= mem::size_of::<InlineBuf>() && layout.align() <= mem::align_of::<InlineBuf>()
}

/// Heap storage for `layout`; zero-sized layouts get an aligned dangling pointer
unsafe fn heap_alloc(layout: Layout) -> NonNull<u8> {
    if layout.size() == 0 {
        return dangling(layout);
    }
    match NonNull::new(alloc::alloc(layout)) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(layout),
    }
}

/// Release storage from [`heap_alloc`]
unsafe fn heap_dealloc(ptr: NonNull<u8>, layout: Layout) {
    if layout.size() != 0 {
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}

fn dangling(layout: Layout) -> NonNull<u8> {
    // Alignment is a nonzero power of two.
    NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling())
}

enum Storage {
    Empty,
    Inline(InlineBuf),
    Heap(NonNull<u8>),
    Ref(NonNull<u8>),
    RefMut(NonNull<u8>),
}

/// Type-erased value or reference
pub struct Any<'a> {
    data: Option<&'static TypeData>,
    storage: Storage,
    _marker: PhantomData<&'a mut ()>,
}

// SAFETY: every reflected type is `Send + Sync`, and references are only
// created from borrows that are themselves `Send`/`Sync`.
unsafe impl Send for Any<'_> {}
unsafe impl Sync for Any<'_> {}

impl Any<'static> {
    /// Take ownership of a value
    pub fn new<T: Reflect>(value: T) -> Self {
        // SAFETY: `init` writes a valid `T` into storage laid out for `T`.
        unsafe {
            Self::alloc_with(TypeData::of::<T>(), |dst| dst.cast::<T>().write(value))
        }
    }

    /// Allocate owned storage for `data` and initialize it in place
    ///
    /// # Safety
    ///
    /// `init` must write a valid value of the type described by `data`.
    unsafe fn alloc_with(data: &'static TypeData, init: impl FnOnce(*mut u8)) -> Self {
        let layout = data.layout();
        let mut this = Self {
            data: None,
            storage: Storage::Empty,
            _marker: PhantomData,
        };
        if fits_inline(layout) {
            this.storage = Storage::Inline(MaybeUninit::uninit());
        } else {
            this.storage = Storage::Heap(heap_alloc(layout));
        }
        // Type is set only after `init` succeeds, so a panic frees without dropping.
        if let Some(dst) = this.storage_ptr_mut() {
            init(dst.as_ptr());
        }
        this.data = Some(data);
        this
    }
}

impl<'a> Any<'a> {
    /// An empty container
    pub const fn empty() -> Self {
        Self {
            data: None,
            storage: Storage::Empty,
            _marker: PhantomData,
        }
    }

    /// Const reference to a value
    pub fn from_ref<T: Reflect>(value: &'a T) -> Self {
        // SAFETY: the pointer comes from a live borrow of `T` for `'a`.
        unsafe { Self::from_parts(TypeData::of::<T>(), NonNull::from(value).cast(), true) }
    }

    /// Mutable reference to a value
    pub fn from_mut<T: Reflect>(value: &'a mut T) -> Self {
        // SAFETY: the pointer comes from a unique borrow of `T` for `'a`.
        unsafe { Self::from_parts(TypeData::of::<T>(), NonNull::from(value).cast(), false) }
    }

    /// Reference to a value known only by its type
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live value of type `info` that outlives `'a`;
    /// if `is_const` is false it must not be aliased for `'a`.
    pub unsafe fn from_raw(info: TypeInfo, ptr: NonNull<u8>, is_const: bool) -> Self {
        match info.data() {
            Some(data) => Self::from_parts(data, ptr, is_const),
            None => Self::empty(),
        }
    }

    pub(crate) unsafe fn from_parts(data: &'static TypeData, ptr: NonNull<u8>, is_const: bool) -> Self {
        Self {
            data: Some(data),
            storage: if is_const {
                Storage::Ref(ptr)
            } else {
                Storage::RefMut(ptr)
            },
            _marker: PhantomData,
        }
    }

    /// Type of the held value, invalid if empty
    #[inline]
    pub fn type_info(&self) -> TypeInfo {
        self.data.map(TypeInfo::from_data).unwrap_or_default()
    }

    /// Check if nothing is held
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Check if this references a value it does not own
    #[inline]
    pub fn is_ref(&self) -> bool {
        matches!(self.storage, Storage::Ref(_) | Storage::RefMut(_))
    }

    /// Check if this is a const reference
    #[inline]
    pub fn is_const(&self) -> bool {
        matches!(self.storage, Storage::Ref(_))
    }

    /// Check if an owned value is stored inline
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// Pointer to the value
    pub fn data(&self) -> Option<*const u8> {
        self.raw_ptr().map(|ptr| ptr.as_ptr() as *const u8)
    }

    /// Mutable pointer to the value; `None` for const references
    pub fn data_mut(&mut self) -> Option<*mut u8> {
        self.raw_ptr_mut().map(NonNull::as_ptr)
    }

    pub(crate) fn record(&self) -> Option<&'static TypeData> {
        self.data
    }

    pub(crate) fn raw_ptr(&self) -> Option<NonNull<u8>> {
        match &self.storage {
            Storage::Empty => None,
            Storage::Inline(buf) => Some(NonNull::from(buf).cast()),
            Storage::Heap(ptr) | Storage::Ref(ptr) | Storage::RefMut(ptr) => Some(*ptr),
        }
    }

    pub(crate) fn raw_ptr_mut(&mut self) -> Option<NonNull<u8>> {
        match self.storage {
            Storage::Ref(_) => None,
            _ => self.storage_ptr_mut(),
        }
    }

    fn storage_ptr_mut(&mut self) -> Option<NonNull<u8>> {
        match &mut self.storage {
            Storage::Empty => None,
            Storage::Inline(buf) => Some(NonNull::from(buf).cast()),
            Storage::Heap(ptr) | Storage::Ref(ptr) | Storage::RefMut(ptr) => Some(*ptr),
        }
    }

    fn parts(&self) -> Option<(&'static TypeData, NonNull<u8>)> {
        Some((self.data?, self.raw_ptr()?))
    }

    /// Const reference to the held value
    pub fn as_ref(&self) -> Any<'_> {
        match self.parts() {
            // SAFETY: the value lives as long as the borrow of self.
            Some((data, ptr)) => unsafe { Any::from_parts(data, ptr, true) },
            None => Any::empty(),
        }
    }

    /// Mutable reference to the held value
    pub fn as_mut(&mut self) -> Result<Any<'_>> {
        let Some(data) = self.data else {
            return Ok(Any::empty());
        };
        match self.raw_ptr_mut() {
            // SAFETY: the value is uniquely borrowed through self.
            Some(ptr) => Ok(unsafe { Any::from_parts(data, ptr, false) }),
            None => Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("cannot borrow const '{}' as mutable", data.name()),
            )),
        }
    }

    /// Exact-type access; `None` on any other type
    pub fn get<T: Reflect>(&self) -> Option<&T> {
        let (data, ptr) = self.parts()?;
        if data.type_id() != core::any::TypeId::of::<T>() {
            return None;
        }
        // SAFETY: the held value is a `T`.
        Some(unsafe { &*ptr.as_ptr().cast::<T>() })
    }

    /// Exact-type mutable access; `None` on any other type or a const reference
    pub fn get_mut<T: Reflect>(&mut self) -> Option<&mut T> {
        let data = self.data?;
        if data.type_id() != core::any::TypeId::of::<T>() {
            return None;
        }
        let ptr = self.raw_ptr_mut()?;
        // SAFETY: the held value is a `T`, uniquely borrowed through self.
        Some(unsafe { &mut *ptr.as_ptr().cast::<T>() })
    }

    /// Const reference to the `target` sub-object along declared parents
    ///
    /// Empty if no path exists or if paths reach different sub-objects.
    pub fn as_type(&self, target: TypeInfo) -> Any<'_> {
        let (Some((data, ptr)), Some(target)) = (self.parts(), target.data()) else {
            return Any::empty();
        };
        match upcast(data, ptr, target, false) {
            // SAFETY: parent projections land inside the borrowed value.
            Cast::Found(base) => unsafe { Any::from_parts(target, base, true) },
            Cast::Missing | Cast::Ambiguous(_) => Any::empty(),
        }
    }

    /// Like [`as_type`](Any::as_type), keeping mutability unless this is const
    pub fn as_type_mut(&mut self, target: TypeInfo) -> Any<'_> {
        if self.is_const() {
            return self.as_type(target);
        }
        let (Some(data), Some(target)) = (self.data, target.data()) else {
            return Any::empty();
        };
        let Some(ptr) = self.raw_ptr_mut() else {
            return Any::empty();
        };
        match upcast(data, ptr, target, true) {
            // SAFETY: parent projections land inside the uniquely borrowed value.
            Cast::Found(base) => unsafe { Any::from_parts(target, base, false) },
            Cast::Missing | Cast::Ambiguous(_) => Any::empty(),
        }
    }

    /// Typed parent-aware cast
    pub fn cast<T: Reflect>(&self) -> Result<&T> {
        let (data, ptr) = self.parts().ok_or_else(|| Error::empty_any("cast"))?;
        let target = TypeData::of::<T>();
        let base = cast_result(data, target, upcast(data, ptr, target, false))?;
        // SAFETY: the walk ends on a `T` sub-object of the borrowed value.
        Ok(unsafe { &*base.as_ptr().cast::<T>() })
    }

    /// Typed parent-aware mutable cast
    pub fn cast_mut<T: Reflect>(&mut self) -> Result<&mut T> {
        let data = self.data.ok_or_else(|| Error::empty_any("cast"))?;
        let ptr = self.raw_ptr_mut().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidQualifier,
                format!("cannot cast const '{}' to a mutable reference", data.name()),
            )
        })?;
        let target = TypeData::of::<T>();
        let base = cast_result(data, target, upcast(data, ptr, target, true))?;
        // SAFETY: the walk ends on a `T` sub-object of the uniquely borrowed value.
        Ok(unsafe { &mut *base.as_ptr().cast::<T>() })
    }

    /// Convert into an owned value of `target`
    ///
    /// Uses a registered conversion, or copies the value (or its `target`
    /// parent sub-object). Empty if no conversion applies.
    pub fn conv(&self, target: TypeInfo) -> Any<'static> {
        let (Some((data, ptr)), Some(target_data)) = (self.parts(), target.data()) else {
            return Any::empty();
        };
        if ptr::eq(data, target_data) {
            return self.try_clone().unwrap_or_default();
        }
        if let Some(convert) = data.find_conversion(target_data) {
            return convert(ptr.as_ptr());
        }
        let base = self.as_type(target);
        if base.is_empty() {
            return Any::empty();
        }
        base.try_clone().unwrap_or_default()
    }

    /// Like [`conv`](Any::conv), failing if no conversion applies
    pub fn try_conv(&self, target: TypeInfo) -> Result<Any<'static>> {
        if self.is_empty() {
            return Err(Error::empty_any("convert"));
        }
        let converted = self.conv(target);
        if converted.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidType,
                format!(
                    "no conversion from '{}' to '{}'",
                    self.type_info().name(),
                    target.name()
                ),
            ));
        }
        Ok(converted)
    }

    /// Deep copy into an owned value
    ///
    /// Empty stays empty. Copying a reference copies the referenced value.
    pub fn try_clone(&self) -> Result<Any<'static>> {
        let Some((data, ptr)) = self.parts() else {
            return Ok(Any::empty());
        };
        if let Some(clone) = data.vtable.clone {
            // SAFETY: the clone thunk writes a valid copy of the value.
            return Ok(unsafe { Any::alloc_with(data, |dst| clone(ptr.as_ptr(), dst)) });
        }

        let this = TypeInfo::from_data(data);
        let copy_constructor = data
            .members()
            .constructors
            .iter()
            .find(|ctor| {
                ctor.arity() == 1 && ctor.args()[0].is_const() && ctor.args()[0].type_info() == this
            })
            .cloned();
        match copy_constructor {
            Some(ctor) => ctor.invoke(&mut [self.as_ref()]),
            None => Err(Error::new(
                ErrorKind::NotCopyable,
                format!("'{}' has no copy constructor", data.name()),
            )),
        }
    }

    /// Replace this container with a copy of `other`
    ///
    /// A reference destination becomes an owned copy; the referenced value
    /// is left untouched. Use [`write`](Any::write) to assign through.
    pub fn assign(&mut self, other: &Any<'_>) -> Result<()> {
        *self = other.try_clone()?;
        Ok(())
    }

    /// Overwrite the held value in place with a copy or conversion of `value`
    pub fn write(&mut self, value: &Any<'_>) -> Result<()> {
        let data = self.data.ok_or_else(|| Error::empty_any("write to"))?;
        let dst = self.raw_ptr_mut().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidQualifier,
                format!("cannot write to const '{}'", data.name()),
            )
        })?;
        let mut source = if value.record().map_or(false, |found| ptr::eq(found, data)) {
            value.try_clone()?
        } else {
            let converted = value.conv(TypeInfo::from_data(data));
            if converted.is_empty() {
                return Err(Error::invalid_type(data.name(), value.type_info().name()));
            }
            converted
        };
        // SAFETY: `dst` holds a live value of `data`; `source` is an owned value of `data`.
        unsafe {
            (data.vtable.drop)(dst.as_ptr());
            source.move_into(dst.as_ptr());
        }
        Ok(())
    }

    /// Move the contents out, leaving this empty
    pub fn take(&mut self) -> Any<'a> {
        mem::take(self)
    }

    /// Drop the held value, leaving this empty
    pub fn reset(&mut self) {
        let data = self.data.take();
        let storage = mem::replace(&mut self.storage, Storage::Empty);
        let Some(data) = data else {
            return;
        };
        // SAFETY: owned storage holds a live value of `data`.
        unsafe {
            match storage {
                Storage::Inline(mut buf) => (data.vtable.drop)(buf.as_mut_ptr().cast()),
                Storage::Heap(ptr) => {
                    (data.vtable.drop)(ptr.as_ptr());
                    heap_dealloc(ptr, data.layout());
                }
                Storage::Empty | Storage::Ref(_) | Storage::RefMut(_) => {}
            }
        }
    }

    /// Recover the `'a` borrow a reference was made from
    pub fn into_ref<T: Reflect>(self) -> Result<&'a T> {
        let ptr = self.borrowed_ptr::<T>(false)?;
        // SAFETY: reference storage points to a live `T` borrowed for `'a`.
        Ok(unsafe { &*ptr.as_ptr().cast::<T>() })
    }

    /// Recover the unique `'a` borrow a mutable reference was made from
    pub fn into_mut<T: Reflect>(self) -> Result<&'a mut T> {
        let ptr = self.borrowed_ptr::<T>(true)?;
        // SAFETY: mutable reference storage uniquely borrows a live `T` for `'a`.
        Ok(unsafe { &mut *ptr.as_ptr().cast::<T>() })
    }

    fn borrowed_ptr<T: Reflect>(&self, mutable: bool) -> Result<NonNull<u8>> {
        let data = self.data.ok_or_else(|| Error::empty_any("borrow from"))?;
        if data.type_id() != core::any::TypeId::of::<T>() {
            return Err(Error::invalid_type(TypeData::of::<T>().name(), data.name()));
        }
        match self.storage {
            Storage::RefMut(ptr) => Ok(ptr),
            Storage::Ref(ptr) if !mutable => Ok(ptr),
            Storage::Ref(_) => Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("cannot borrow const '{}' as mutable", data.name()),
            )),
            Storage::Empty | Storage::Inline(_) | Storage::Heap(_) => Err(Error::new(
                ErrorKind::ExpectedRefAny,
                format!("'{}' is owned, not a reference", data.name()),
            )),
        }
    }

    /// Move an owned `T` out; references and other types are handed back
    pub fn downcast<T: Reflect>(mut self) -> core::result::Result<T, Self> {
        if self.is_ref() || self.get::<T>().is_none() {
            return Err(self);
        }
        let mut out = MaybeUninit::<T>::uninit();
        // SAFETY: the owned value is a `T`; ownership moves to `out`.
        unsafe {
            self.move_into(out.as_mut_ptr().cast());
            Ok(out.assume_init())
        }
    }

    /// Detach from any borrow, copying referenced values
    pub fn into_owned(mut self) -> Result<Any<'static>> {
        if self.is_ref() {
            return self.try_clone();
        }
        Ok(Any {
            data: self.data.take(),
            storage: mem::replace(&mut self.storage, Storage::Empty),
            _marker: PhantomData,
        })
    }

    /// Move the owned value's bytes to `dst` and release the storage
    ///
    /// # Safety
    ///
    /// This must own its value and `dst` must be valid for a write of it.
    unsafe fn move_into(&mut self, dst: *mut u8) {
        debug_assert!(!self.is_ref());
        let Some((data, src)) = self.parts() else {
            return;
        };
        ptr::copy_nonoverlapping(src.as_ptr(), dst, data.layout().size());
        self.data = None;
        if let Storage::Heap(ptr) = mem::replace(&mut self.storage, Storage::Empty) {
            heap_dealloc(ptr, data.layout());
        }
    }

    /// View as a range
    pub fn range(&self) -> Result<AnyRange<'_>> {
        AnyRange::new(self.as_ref())
    }

    /// View as a range with mutable access
    pub fn range_mut(&mut self) -> Result<AnyRange<'_>> {
        AnyRange::new(self.as_mut()?)
    }

    /// Turn into a range view
    pub fn into_range(self) -> Result<AnyRange<'a>> {
        AnyRange::new(self)
    }

    /// View as a table
    pub fn table(&self) -> Result<AnyTable<'_>> {
        AnyTable::new(self.as_ref())
    }

    /// View as a table with mutable access
    pub fn table_mut(&mut self) -> Result<AnyTable<'_>> {
        AnyTable::new(self.as_mut()?)
    }

    /// Turn into a table view
    pub fn into_table(self) -> Result<AnyTable<'a>> {
        AnyTable::new(self)
    }

    /// View as a tuple
    pub fn tuple(&self) -> Result<AnyTuple<'_>> {
        AnyTuple::new(self.as_ref())
    }

    /// View as a tuple with mutable access
    pub fn tuple_mut(&mut self) -> Result<AnyTuple<'_>> {
        AnyTuple::new(self.as_mut()?)
    }

    /// Turn into a tuple view
    pub fn into_tuple(self) -> Result<AnyTuple<'a>> {
        AnyTuple::new(self)
    }

    /// Text of a string-shaped value
    pub fn as_str(&self) -> Option<&str> {
        let (data, ptr) = self.parts()?;
        let shape = data.shapes.string.as_ref()?;
        // SAFETY: the value lives as long as the borrow of self.
        Some(unsafe { shape.view(ptr.as_ptr()) })
    }

    /// Replace the text of a string-shaped value
    pub fn set_str(&mut self, text: &str) -> Result<()> {
        let data = self.data.ok_or_else(|| Error::empty_any("assign a string to"))?;
        let shape = data.shapes.string.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidType,
                format!("'{}' is not a string", data.name()),
            )
        })?;
        let read_only = || {
            Error::new(
                ErrorKind::InvalidQualifier,
                format!("'{}' is read-only", data.name()),
            )
        };
        let ptr = self.raw_ptr_mut().ok_or_else(read_only)?;
        // SAFETY: the value is uniquely borrowed through self.
        if unsafe { shape.assign(ptr.as_ptr(), text) } {
            Ok(())
        } else {
            Err(read_only())
        }
    }
}

/// Outcome of a parent walk
enum Cast {
    Found(NonNull<u8>),
    Missing,
    Ambiguous(usize),
}

/// Walk every declared parent path from `data` to `target`
fn upcast(data: &'static TypeData, ptr: NonNull<u8>, target: &'static TypeData, mutable: bool) -> Cast {
    let mut found = Vec::new();
    collect_paths(data, ptr, target, mutable, 0, &mut found);
    match found.as_slice() {
        [] => Cast::Missing,
        [single] => Cast::Found(*single),
        many => Cast::Ambiguous(many.len()),
    }
}

fn collect_paths(
    data: &'static TypeData,
    ptr: NonNull<u8>,
    target: &'static TypeData,
    mutable: bool,
    depth: usize,
    found: &mut Vec<NonNull<u8>>,
) {
    if ptr::eq(data, target) {
        if !found.contains(&ptr) {
            found.push(ptr);
        }
        return;
    }
    if depth >= MAX_PARENT_DEPTH {
        log::warn!("Parent chain of '{}' exceeds {} levels", data.name(), MAX_PARENT_DEPTH);
        return;
    }
    for parent in data.parents() {
        // SAFETY: `ptr` points to a live value of `data`.
        if let Some(base) = unsafe { parent.apply(ptr, mutable) } {
            collect_paths(parent.parent.data(), base, target, mutable, depth + 1, found);
        }
    }
}

fn cast_result(data: &'static TypeData, target: &'static TypeData, cast: Cast) -> Result<NonNull<u8>> {
    match cast {
        Cast::Found(ptr) => Ok(ptr),
        Cast::Missing => Err(Error::invalid_type(target.name(), data.name())),
        Cast::Ambiguous(paths) => Err(Error::new(
            ErrorKind::AmbiguousCast,
            format!(
                "'{}' reaches {} distinct '{}' sub-objects",
                data.name(),
                paths,
                target.name()
            ),
        )),
    }
}

impl Default for Any<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Any<'_> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<'b> PartialEq<Any<'b>> for Any<'_> {
    /// Equal only if both hold the same comparable type and the values match
    fn eq(&self, other: &Any<'b>) -> bool {
        match (self.parts(), other.parts()) {
            (Some((a, lhs)), Some((b, rhs))) if ptr::eq(a, b) => a
                .vtable
                .eq
                // SAFETY: both pointers hold live values of the same type.
                .map_or(false, |eq| unsafe { eq(lhs.as_ptr(), rhs.as_ptr()) }),
            _ => false,
        }
    }
}

impl<'b> PartialOrd<Any<'b>> for Any<'_> {
    /// Unordered unless both hold the same ordered type
    fn partial_cmp(&self, other: &Any<'b>) -> Option<Ordering> {
        match (self.parts(), other.parts()) {
            (Some((a, lhs)), Some((b, rhs))) if ptr::eq(a, b) => {
                let cmp = a.vtable.cmp?;
                // SAFETY: both pointers hold live values of the same type.
                unsafe { cmp(lhs.as_ptr(), rhs.as_ptr()) }
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Any<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            None => write!(f, "Any(empty)"),
            // SAFETY: the pointer holds a live value of the type.
            Some((data, ptr)) => match data.vtable.debug {
                Some(debug) => unsafe { debug(ptr.as_ptr(), f) },
                None => write!(f, "Any<{}>", data.name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[test]
    fn test_inline_and_heap_storage() {
        let small = Any::new(7u64);
        assert!(small.is_local());
        assert_eq!(small.get::<u64>(), Some(&7));

        let large = Any::new([1u64, 2, 3, 4]);
        assert!(!large.is_local());
        assert!(!large.is_ref());
        assert_eq!(large.get::<[u64; 4]>(), Some(&[1, 2, 3, 4]));

        let aligned = Any::new(1u128);
        assert!(!aligned.is_local());
    }

    #[test]
    fn test_zero_sized_over_aligned() {
        #[derive(Clone, Debug, PartialEq)]
        #[repr(align(32))]
        struct Tag;
        impl Reflect for Tag {
            fn describe(d: &mut Descriptor<Self>) {
                d.copyable().comparable();
            }
        }

        let tag = Any::new(Tag);
        assert!(!tag.is_local());
        let ptr = tag.data().unwrap();
        assert_eq!(ptr as usize % 32, 0);
        assert_eq!(tag.get::<Tag>(), Some(&Tag));

        let copy = tag.try_clone().unwrap();
        assert_eq!(copy, tag);
        assert_eq!(copy.downcast::<Tag>().ok(), Some(Tag));
    }

    #[test]
    fn test_exact_type_access() {
        let mut value = Any::new(5i32);
        assert!(value.get::<i64>().is_none());
        *value.get_mut::<i32>().unwrap() += 1;
        assert_eq!(value.get::<i32>(), Some(&6));

        let empty = Any::empty();
        assert!(empty.is_empty());
        assert!(!empty.type_info().is_valid());
        assert!(empty.get::<i32>().is_none());
    }

    #[test]
    fn test_const_reference_is_read_only() {
        let number = 3i32;
        let mut view = Any::from_ref(&number);
        assert!(view.is_ref());
        assert!(view.is_const());
        assert!(view.data_mut().is_none());
        assert!(view.get_mut::<i32>().is_none());
        assert!(view.as_mut().unwrap_err().is(ErrorKind::InvalidQualifier));
        assert!(view.cast_mut::<i32>().unwrap_err().is(ErrorKind::InvalidQualifier));
        assert_eq!(view.data(), Some(&number as *const i32 as *const u8));
    }

    #[test]
    fn test_mutable_reference_writes_through() {
        let mut number = 3i32;
        {
            let mut view = Any::from_mut(&mut number);
            *view.get_mut::<i32>().unwrap() = 4;
            view.write(&Any::new(9i32)).unwrap();
        }
        assert_eq!(number, 9);
    }

    #[test]
    fn test_write_converts() {
        let mut value = Any::new(1.5f64);
        value.write(&Any::new(2i32)).unwrap();
        assert_eq!(value.get::<f64>(), Some(&2.0));
        assert!(value.write(&Any::new("text")).unwrap_err().is(ErrorKind::InvalidType));
    }

    #[test]
    fn test_assign_rebinds_reference() {
        let mut number = 3i32;
        let mut view = Any::from_mut(&mut number);
        view.assign(&Any::new(10i32)).unwrap();
        assert!(!view.is_ref());
        assert_eq!(view.get::<i32>(), Some(&10));
        drop(view);
        assert_eq!(number, 3);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Any::new(vec![1, 2]);
        let mut copy = original.try_clone().unwrap();
        assert_eq!(copy, original);
        copy.get_mut::<Vec<i32>>().unwrap().push(3);
        assert_ne!(copy, original);
        assert_eq!(original.get::<Vec<i32>>(), Some(&vec![1, 2]));
    }

    #[test]
    fn test_clone_of_reference_is_owned() {
        let text = String::from("shared");
        let view = Any::from_ref(&text);
        let copy = view.try_clone().unwrap();
        assert!(!copy.is_ref());
        assert_eq!(copy, view);
    }

    #[test]
    fn test_not_copyable() {
        struct Unique;
        impl Reflect for Unique {}

        let err = Any::new(Unique).try_clone().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotCopyable);
    }

    #[test]
    fn test_clone_falls_back_to_constructor() {
        struct Handle(u32);
        impl Reflect for Handle {
            fn describe(d: &mut Descriptor<Self>) {
                d.constructor(|other: &Handle| Handle(other.0 + 100));
            }
        }

        let copy = Any::new(Handle(1)).try_clone().unwrap();
        assert_eq!(copy.get::<Handle>().map(|h| h.0), Some(101));
    }

    #[test]
    fn test_mismatched_types_never_equal() {
        let a = Any::new(5i32);
        let b = Any::new(5.0f64);
        assert!(a != b);
        assert!(a.partial_cmp(&b).is_none());
        assert!(Any::empty() != Any::empty());
        assert!(Any::new(1i32) < Any::new(2i32));
    }

    #[test]
    fn test_conv() {
        let a = Any::new(5i32);
        let converted = a.conv(TypeInfo::of::<f64>());
        assert_eq!(converted.get::<f64>(), Some(&5.0));
        assert!(a.conv(TypeInfo::of::<String>()).is_empty());
        assert!(a.try_conv(TypeInfo::of::<String>()).unwrap_err().is(ErrorKind::InvalidType));
        assert_eq!(a.conv(TypeInfo::of::<i32>()), a);
    }

    #[test]
    fn test_take_and_downcast() {
        let mut value = Any::new(String::from("moved"));
        let taken = value.take();
        assert!(value.is_empty());
        let taken = taken.downcast::<i32>().unwrap_err();
        assert_eq!(taken.downcast::<String>().unwrap(), "moved");
    }

    #[test]
    fn test_drop_runs_once() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Counted(#[allow(dead_code)] [u64; 8]);
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, AtomicOrdering::SeqCst);
            }
        }
        impl Reflect for Counted {}

        let value = Any::new(Counted([0; 8]));
        let moved = value;
        drop(moved);
        assert_eq!(DROPS.load(AtomicOrdering::SeqCst), 1);

        let downcast = Any::new(Counted([1; 8])).downcast::<Counted>();
        assert_eq!(DROPS.load(AtomicOrdering::SeqCst), 1);
        drop(downcast);
        assert_eq!(DROPS.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_into_ref_keeps_original_borrow() {
        let mut values = vec![1u16, 2];
        let first: &mut Vec<u16> = Any::from_mut(&mut values).into_mut().unwrap();
        first.push(3);
        assert_eq!(Any::from_ref(&values).into_ref::<Vec<u16>>().unwrap().len(), 3);

        let err = Any::new(5u16).into_ref::<u16>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpectedRefAny);
        let err = Any::from_ref(&values).into_mut::<Vec<u16>>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQualifier);
        let err = Any::from_ref(&values).into_ref::<u16>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        let err = Any::empty().into_ref::<u16>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEmptyAny);
    }

    #[test]
    fn test_into_owned_detaches() {
        let shared = Arc::new(5u8);
        let owned = {
            let view = Any::from_ref(&*shared);
            view.into_owned().unwrap()
        };
        assert!(!owned.is_ref());
        assert_eq!(owned.get::<u8>(), Some(&5));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Any::new(42i32)), "42");
        assert_eq!(format!("{:?}", Any::empty()), "Any(empty)");
    }
}
