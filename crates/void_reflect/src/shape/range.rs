//! Range shape: erased iteration over a sequence

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::any::Any;
use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::TypeHandle;
use crate::type_data::TypeData;
use crate::type_info::TypeInfo;

/// Iterator category of a range
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IterCategory {
    /// Forward iteration only
    Forward,
    /// Iteration from both ends
    Bidirectional,
    /// Indexed access
    RandomAccess,
}

/// A forward-iterable sequence of reflected items
pub trait RangeLike: Reflect {
    /// Item type
    type Item: Reflect;

    /// Number of items, if known without iterating
    fn range_len(&self) -> Option<usize> {
        None
    }

    /// Iterate over shared items
    fn range_iter(&self) -> Box<dyn Iterator<Item = &Self::Item> + '_>;

    /// Iterate over mutable items, if the sequence allows it
    fn range_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = &mut Self::Item> + '_>> {
        None
    }
}

/// A range that can also be iterated from the back
pub trait BidirectionalRange: RangeLike {
    /// Double ended iteration over shared items
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &Self::Item> + '_>;

    /// Double ended iteration over mutable items
    fn range_iter_double_mut(
        &mut self,
    ) -> Option<Box<dyn DoubleEndedIterator<Item = &mut Self::Item> + '_>> {
        None
    }
}

/// A range with indexed access
pub trait RandomAccessRange: BidirectionalRange {
    /// Item at `index`
    fn range_at(&self, index: usize) -> Option<&Self::Item>;

    /// Mutable item at `index`
    fn range_at_mut(&mut self, index: usize) -> Option<&mut Self::Item> {
        let _ = index;
        None
    }
}

/// Item pointers produced by an erased iteration
pub(crate) enum RawCursor {
    Forward(Box<dyn Iterator<Item = NonNull<u8>>>),
    Bidirectional(Box<dyn DoubleEndedIterator<Item = NonNull<u8>>>),
}

type LenFn = unsafe fn(*const u8) -> Option<usize>;
type IterFn = unsafe fn(*const u8) -> RawCursor;
type IterMutFn = unsafe fn(*mut u8) -> Option<RawCursor>;
type AtFn = unsafe fn(*const u8, usize) -> Option<NonNull<u8>>;
type AtMutFn = unsafe fn(*mut u8, usize) -> Option<NonNull<u8>>;

/// Range capability table of one type
pub(crate) struct RangeShape {
    item: TypeHandle,
    category: IterCategory,
    len: LenFn,
    iter: IterFn,
    iter_mut: IterMutFn,
    at: Option<AtFn>,
    at_mut: Option<AtMutFn>,
}

impl RangeShape {
    pub(crate) fn forward<C: RangeLike>() -> Self {
        Self {
            item: TypeHandle::of::<C::Item>(),
            category: IterCategory::Forward,
            len: len_thunk::<C>,
            iter: forward_iter::<C>,
            iter_mut: forward_iter_mut::<C>,
            at: None,
            at_mut: None,
        }
    }

    pub(crate) fn bidirectional<C: BidirectionalRange>() -> Self {
        Self {
            category: IterCategory::Bidirectional,
            iter: double_iter::<C>,
            iter_mut: double_iter_mut::<C>,
            ..Self::forward::<C>()
        }
    }

    pub(crate) fn random_access<C: RandomAccessRange>() -> Self {
        Self {
            category: IterCategory::RandomAccess,
            at: Some(at_thunk::<C>),
            at_mut: Some(at_mut_thunk::<C>),
            ..Self::bidirectional::<C>()
        }
    }

    pub(crate) fn item(&self) -> TypeInfo {
        self.item.resolve()
    }
}

// The `'static` borrows below never escape: the cursor is wrapped in an
// `AnyIter` that carries the real lifetime of the container.

unsafe fn len_thunk<C: RangeLike>(range: *const u8) -> Option<usize> {
    (*range.cast::<C>()).range_len()
}

unsafe fn forward_iter<C: RangeLike>(range: *const u8) -> RawCursor {
    let range: &'static C = &*range.cast::<C>();
    RawCursor::Forward(Box::new(range.range_iter().map(|item| NonNull::from(item).cast())))
}

unsafe fn forward_iter_mut<C: RangeLike>(range: *mut u8) -> Option<RawCursor> {
    let range: &'static mut C = &mut *range.cast::<C>();
    let iter = range.range_iter_mut()?;
    Some(RawCursor::Forward(Box::new(iter.map(|item| NonNull::from(item).cast()))))
}

unsafe fn double_iter<C: BidirectionalRange>(range: *const u8) -> RawCursor {
    let range: &'static C = &*range.cast::<C>();
    RawCursor::Bidirectional(Box::new(
        range.range_iter_double().map(|item| NonNull::from(item).cast()),
    ))
}

unsafe fn double_iter_mut<C: BidirectionalRange>(range: *mut u8) -> Option<RawCursor> {
    let range: &'static mut C = &mut *range.cast::<C>();
    let iter = range.range_iter_double_mut()?;
    Some(RawCursor::Bidirectional(Box::new(
        iter.map(|item| NonNull::from(item).cast()),
    )))
}

unsafe fn at_thunk<C: RandomAccessRange>(range: *const u8, index: usize) -> Option<NonNull<u8>> {
    (*range.cast::<C>()).range_at(index).map(|item| NonNull::from(item).cast())
}

unsafe fn at_mut_thunk<C: RandomAccessRange>(range: *mut u8, index: usize) -> Option<NonNull<u8>> {
    (*range.cast::<C>())
        .range_at_mut(index)
        .map(|item| NonNull::from(item).cast())
}

/// Erased view of a range-shaped value
pub struct AnyRange<'a> {
    shape: &'static RangeShape,
    target: Any<'a>,
}

impl<'a> AnyRange<'a> {
    /// View `target` as a range
    pub fn new(target: Any<'a>) -> Result<Self> {
        let data = target.record().ok_or_else(|| Error::empty_any("view as range"))?;
        match &data.shapes.range {
            Some(shape) => Ok(Self { shape, target }),
            None => Err(Error::new(
                ErrorKind::InvalidType,
                format!("'{}' is not a range", data.name()),
            )),
        }
    }

    /// The viewed value
    pub fn target(&self) -> &Any<'a> {
        &self.target
    }

    /// Give back the viewed value
    pub fn into_target(self) -> Any<'a> {
        self.target
    }

    /// Item type
    pub fn value_type(&self) -> TypeInfo {
        self.shape.item()
    }

    /// Iterator category
    pub fn category(&self) -> IterCategory {
        self.shape.category
    }

    /// Whether iteration from the back is supported
    pub fn is_bidirectional(&self) -> bool {
        self.shape.category >= IterCategory::Bidirectional
    }

    /// Whether indexed access is supported
    pub fn is_random_access(&self) -> bool {
        self.shape.category == IterCategory::RandomAccess
    }

    /// Number of items, if the range is sized
    pub fn len(&self) -> Option<usize> {
        self.target
            .raw_ptr()
            .and_then(|ptr| unsafe { (self.shape.len)(ptr.as_ptr()) })
    }

    /// Whether the range has no items
    pub fn is_empty(&self) -> bool {
        match self.len() {
            Some(len) => len == 0,
            None => self.iter().next().is_none(),
        }
    }

    /// Iterate over const item references
    pub fn iter(&self) -> AnyIter<'_> {
        let cursor = self
            .target
            .raw_ptr()
            // SAFETY: the target holds a live value of the described type.
            .map(|ptr| unsafe { (self.shape.iter)(ptr.as_ptr()) });
        AnyIter::new(self.shape.item.data(), cursor, true)
    }

    /// Iterate over mutable item references
    pub fn iter_mut(&mut self) -> Result<AnyIter<'_>> {
        let item = self.shape.item.data();
        let iter_mut = self.shape.iter_mut;
        let ptr = self.target_mut()?;
        // SAFETY: exclusive access to the target is held for the iterator's lifetime.
        match unsafe { iter_mut(ptr.as_ptr()) } {
            Some(cursor) => Ok(AnyIter::new(item, Some(cursor), false)),
            None => Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("'{}' does not allow mutable iteration", self.target.type_info().name()),
            )),
        }
    }

    /// First item
    pub fn front(&self) -> Option<Any<'_>> {
        self.iter().next()
    }

    /// Last item, for bidirectional ranges
    pub fn back(&self) -> Option<Any<'_>> {
        if self.is_bidirectional() {
            self.iter().next_back()
        } else {
            None
        }
    }

    /// Item at `index`, for random access ranges
    pub fn at(&self, index: usize) -> Result<Any<'_>> {
        let at = self.shape.at.ok_or_else(|| self.not_random_access())?;
        let ptr = self.target.raw_ptr().ok_or_else(|| Error::empty_any("index"))?;
        // SAFETY: the target holds a live value of the described type.
        match unsafe { at(ptr.as_ptr(), index) } {
            Some(item) => Ok(unsafe { Any::from_parts(self.shape.item.data(), item, true) }),
            None => Err(out_of_range(index)),
        }
    }

    /// Mutable item at `index`, for random access ranges
    pub fn at_mut(&mut self, index: usize) -> Result<Any<'_>> {
        let at_mut = self.shape.at_mut.ok_or_else(|| self.not_random_access())?;
        let item = self.shape.item.data();
        let ptr = self.target_mut()?;
        // SAFETY: exclusive access to the target is held for the result's lifetime.
        match unsafe { at_mut(ptr.as_ptr(), index) } {
            Some(value) => Ok(unsafe { Any::from_parts(item, value, false) }),
            None => Err(out_of_range(index)),
        }
    }

    fn target_mut(&mut self) -> Result<NonNull<u8>> {
        if self.target.is_const() {
            return Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("range '{}' is const", self.target.type_info().name()),
            ));
        }
        self.target
            .raw_ptr_mut()
            .ok_or_else(|| Error::empty_any("mutate"))
    }

    fn not_random_access(&self) -> Error {
        Error::new(
            ErrorKind::InvalidType,
            format!("'{}' is not a random access range", self.target.type_info().name()),
        )
    }
}

fn out_of_range(index: usize) -> Error {
    Error::invalid_param(0, format!("index {} out of range", index))
}

impl fmt::Debug for AnyRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the items of an [`AnyRange`]
pub struct AnyIter<'a> {
    item: &'static TypeData,
    cursor: Option<RawCursor>,
    is_const: bool,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> AnyIter<'a> {
    fn new(item: &'static TypeData, cursor: Option<RawCursor>, is_const: bool) -> Self {
        Self {
            item,
            cursor,
            is_const,
            _marker: PhantomData,
        }
    }

    fn wrap(&self, ptr: NonNull<u8>) -> Any<'a> {
        // SAFETY: cursor items point into the container borrowed for `'a`.
        unsafe { Any::from_parts(self.item, ptr, self.is_const) }
    }
}

impl<'a> Iterator for AnyIter<'a> {
    type Item = Any<'a>;

    fn next(&mut self) -> Option<Any<'a>> {
        let ptr = match self.cursor.as_mut()? {
            RawCursor::Forward(iter) => iter.next()?,
            RawCursor::Bidirectional(iter) => iter.next()?,
        };
        Some(self.wrap(ptr))
    }
}

impl<'a> DoubleEndedIterator for AnyIter<'a> {
    /// Yields nothing for forward-only ranges
    fn next_back(&mut self) -> Option<Any<'a>> {
        let ptr = match self.cursor.as_mut()? {
            RawCursor::Forward(_) => return None,
            RawCursor::Bidirectional(iter) => iter.next_back()?,
        };
        Some(self.wrap(ptr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vec_range() {
        let values = vec![1, 2, 3];
        let range = Any::from_ref(&values).into_range().unwrap();
        assert_eq!(range.len(), Some(3));
        assert!(range.is_random_access());
        assert_eq!(range.value_type(), TypeInfo::of::<i32>());

        let items: Vec<i32> = range.iter().map(|item| *item.get::<i32>().unwrap()).collect();
        assert_eq!(items, values);
        assert_eq!(range.back().unwrap().get::<i32>(), Some(&3));
        assert_eq!(range.at(1).unwrap().get::<i32>(), Some(&2));
        assert!(range.at(3).unwrap_err().is(ErrorKind::InvalidParam(0)));
    }

    #[test]
    fn test_mutable_iteration() {
        let mut values = vec![1, 2, 3];
        {
            let mut range = Any::from_mut(&mut values).into_range().unwrap();
            for mut item in range.iter_mut().unwrap() {
                *item.get_mut::<i32>().unwrap() *= 10;
            }
            range.at_mut(0).unwrap().write(&Any::new(7)).unwrap();
        }
        assert_eq!(values, vec![7, 20, 30]);
    }

    #[test]
    fn test_const_range_rejects_mutation() {
        let values = vec![1];
        let mut range = Any::from_ref(&values).into_range().unwrap();
        assert!(range.iter_mut().err().unwrap().is(ErrorKind::InvalidQualifier));
    }

    #[test]
    fn test_forward_only_range() {
        let set: HashSet<u8> = [4].into_iter().collect();
        let range = Any::from_ref(&set).into_range().unwrap();
        assert_eq!(range.category(), IterCategory::Forward);
        assert!(range.back().is_none());
        assert!(range.iter().next_back().is_none());
        assert!(range.at(0).unwrap_err().is(ErrorKind::InvalidType));
    }

    #[test]
    fn test_non_range_is_rejected() {
        let err = AnyRange::new(Any::new(5i32)).unwrap_err();
        assert!(err.is(ErrorKind::InvalidType));
        let err = AnyRange::new(Any::empty()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEmptyAny);
    }
}
