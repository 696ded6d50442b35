//! Table shape: erased key/value lookup and iteration

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::any::Any;
use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::TypeHandle;
use crate::type_data::TypeData;
use crate::type_info::TypeInfo;

/// A key/value container of reflected entries
pub trait TableLike: Reflect {
    /// Key type
    type Key: Reflect;
    /// Value type
    type Value: Reflect;

    /// Number of entries
    fn table_len(&self) -> usize;

    /// Iterate over entries
    fn table_iter(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;

    /// Iterate with mutable values, if the table allows it
    fn table_iter_mut(
        &mut self,
    ) -> Option<Box<dyn Iterator<Item = (&Self::Key, &mut Self::Value)> + '_>> {
        None
    }

    /// Value stored under `key`
    fn table_find(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Mutable value stored under `key`
    fn table_find_mut(&mut self, key: &Self::Key) -> Option<&mut Self::Value> {
        let _ = key;
        None
    }
}

type Entry = (NonNull<u8>, NonNull<u8>);
type EntryIter = Box<dyn Iterator<Item = Entry>>;

/// Table capability table of one type
pub(crate) struct TableShape {
    key: TypeHandle,
    value: TypeHandle,
    len: unsafe fn(*const u8) -> usize,
    iter: unsafe fn(*const u8) -> EntryIter,
    iter_mut: unsafe fn(*mut u8) -> Option<EntryIter>,
    find: unsafe fn(*const u8, *const u8) -> Option<NonNull<u8>>,
    find_mut: unsafe fn(*mut u8, *const u8) -> Option<NonNull<u8>>,
}

impl TableShape {
    pub(crate) fn of<C: TableLike>() -> Self {
        Self {
            key: TypeHandle::of::<C::Key>(),
            value: TypeHandle::of::<C::Value>(),
            len: len_thunk::<C>,
            iter: iter_thunk::<C>,
            iter_mut: iter_mut_thunk::<C>,
            find: find_thunk::<C>,
            find_mut: find_mut_thunk::<C>,
        }
    }
}

unsafe fn len_thunk<C: TableLike>(table: *const u8) -> usize {
    (*table.cast::<C>()).table_len()
}

unsafe fn iter_thunk<C: TableLike>(table: *const u8) -> EntryIter {
    let table: &'static C = &*table.cast::<C>();
    Box::new(
        table
            .table_iter()
            .map(|(key, value)| (NonNull::from(key).cast(), NonNull::from(value).cast())),
    )
}

unsafe fn iter_mut_thunk<C: TableLike>(table: *mut u8) -> Option<EntryIter> {
    let table: &'static mut C = &mut *table.cast::<C>();
    let iter = table.table_iter_mut()?;
    Some(Box::new(
        iter.map(|(key, value)| (NonNull::from(key).cast(), NonNull::from(value).cast())),
    ))
}

unsafe fn find_thunk<C: TableLike>(table: *const u8, key: *const u8) -> Option<NonNull<u8>> {
    (*table.cast::<C>())
        .table_find(&*key.cast::<C::Key>())
        .map(|value| NonNull::from(value).cast())
}

unsafe fn find_mut_thunk<C: TableLike>(table: *mut u8, key: *const u8) -> Option<NonNull<u8>> {
    (*table.cast::<C>())
        .table_find_mut(&*key.cast::<C::Key>())
        .map(|value| NonNull::from(value).cast())
}

/// Erased view of a table-shaped value
pub struct AnyTable<'a> {
    shape: &'static TableShape,
    target: Any<'a>,
}

impl<'a> AnyTable<'a> {
    /// View `target` as a table
    pub fn new(target: Any<'a>) -> Result<Self> {
        let data = target.record().ok_or_else(|| Error::empty_any("view as table"))?;
        match &data.shapes.table {
            Some(shape) => Ok(Self { shape, target }),
            None => Err(Error::new(
                ErrorKind::InvalidType,
                format!("'{}' is not a table", data.name()),
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

    /// Key type
    pub fn key_type(&self) -> TypeInfo {
        self.shape.key.resolve()
    }

    /// Value type
    pub fn value_type(&self) -> TypeInfo {
        self.shape.value.resolve()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        match self.target.raw_ptr() {
            Some(ptr) => unsafe { (self.shape.len)(ptr.as_ptr()) },
            None => 0,
        }
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(key, value)` const references
    pub fn iter(&self) -> AnyTableIter<'_> {
        let entries = self
            .target
            .raw_ptr()
            // SAFETY: the target holds a live value of the described type.
            .map(|ptr| unsafe { (self.shape.iter)(ptr.as_ptr()) });
        AnyTableIter::new(self.shape, entries, true)
    }

    /// Iterate with mutable value references
    pub fn iter_mut(&mut self) -> Result<AnyTableIter<'_>> {
        let shape = self.shape;
        let ptr = self.target_mut()?;
        // SAFETY: exclusive access to the target is held for the iterator's lifetime.
        match unsafe { (shape.iter_mut)(ptr.as_ptr()) } {
            Some(entries) => Ok(AnyTableIter::new(shape, Some(entries), false)),
            None => Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("'{}' does not allow mutable iteration", self.target.type_info().name()),
            )),
        }
    }

    /// Whether an entry exists for `key`
    pub fn contains(&self, key: &Any<'_>) -> bool {
        self.find(key).is_some()
    }

    /// Value stored under `key`; keys of another type are converted first
    pub fn find(&self, key: &Any<'_>) -> Option<Any<'_>> {
        let table = self.target.raw_ptr()?;
        let key = self.bind_key(key)?;
        let key_ptr = key.raw_ptr()?;
        // SAFETY: `key_ptr` points to a live value of the key type.
        let value = unsafe { (self.shape.find)(table.as_ptr(), key_ptr.as_ptr()) }?;
        Some(unsafe { Any::from_parts(self.shape.value.data(), value, true) })
    }

    /// Mutable value stored under `key`
    pub fn find_mut(&mut self, key: &Any<'_>) -> Option<Any<'_>> {
        let shape = self.shape;
        let key = self.bind_key(key)?;
        let key_ptr = key.raw_ptr()?;
        let table = self.target_mut().ok()?;
        // SAFETY: exclusive access to the target is held for the result's lifetime.
        let value = unsafe { (shape.find_mut)(table.as_ptr(), key_ptr.as_ptr()) }?;
        Some(unsafe { Any::from_parts(shape.value.data(), value, false) })
    }

    /// Value stored under `key`, failing if absent
    pub fn at(&self, key: &Any<'_>) -> Result<Any<'_>> {
        self.find(key).ok_or_else(|| self.missing_key(key))
    }

    /// Mutable value stored under `key`, failing if absent
    pub fn at_mut(&mut self, key: &Any<'_>) -> Result<Any<'_>> {
        let missing = self.missing_key(key);
        self.find_mut(key).ok_or(missing)
    }

    /// Key as a value of the key type: a reference when possible
    fn bind_key<'k>(&self, key: &'k Any<'_>) -> Option<Any<'k>> {
        let key_type = self.key_type();
        let bound = key.as_type(key_type);
        if !bound.is_empty() {
            return Some(bound);
        }
        let converted = key.conv(key_type);
        (!converted.is_empty()).then_some(converted)
    }

    fn missing_key(&self, key: &Any<'_>) -> Error {
        Error::invalid_param(0, format!("key {:?} not found in '{}'", key, self.target.type_info().name()))
    }

    fn target_mut(&mut self) -> Result<NonNull<u8>> {
        if self.target.is_const() {
            return Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("table '{}' is const", self.target.type_info().name()),
            ));
        }
        self.target
            .raw_ptr_mut()
            .ok_or_else(|| Error::empty_any("mutate"))
    }
}

impl fmt::Debug for AnyTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the entries of an [`AnyTable`]
pub struct AnyTableIter<'a> {
    key: &'static TypeData,
    value: &'static TypeData,
    entries: Option<EntryIter>,
    is_const: bool,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> AnyTableIter<'a> {
    fn new(shape: &'static TableShape, entries: Option<EntryIter>, is_const: bool) -> Self {
        Self {
            key: shape.key.data(),
            value: shape.value.data(),
            entries,
            is_const,
            _marker: PhantomData,
        }
    }
}

impl<'a> Iterator for AnyTableIter<'a> {
    type Item = (Any<'a>, Any<'a>);

    fn next(&mut self) -> Option<(Any<'a>, Any<'a>)> {
        let (key, value) = self.entries.as_mut()?.next()?;
        // SAFETY: entries point into the table borrowed for `'a`; keys stay const.
        unsafe {
            Some((
                Any::from_parts(self.key, key, true),
                Any::from_parts(self.value, value, self.is_const),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_find_and_contains() {
        let mut scores = HashMap::new();
        scores.insert("alice".to_string(), 3u32);
        scores.insert("bob".to_string(), 5u32);

        let table = Any::from_ref(&scores).into_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.key_type(), TypeInfo::of::<String>());
        assert_eq!(table.value_type(), TypeInfo::of::<u32>());

        let bob = Any::new("bob".to_string());
        assert!(table.contains(&bob));
        assert_eq!(table.find(&bob).unwrap().get::<u32>(), Some(&5));
        assert!(!table.contains(&Any::new("carol".to_string())));
        assert!(table.at(&Any::new("carol".to_string())).unwrap_err().is(ErrorKind::InvalidParam(0)));
    }

    #[test]
    fn test_key_is_converted() {
        let mut names = BTreeMap::new();
        names.insert(1i64, "one".to_string());

        let table = Any::from_ref(&names).into_table().unwrap();
        let value = table.find(&Any::new(1i32)).unwrap();
        assert_eq!(value.get::<String>().map(String::as_str), Some("one"));
    }

    #[test]
    fn test_mutate_through_view() {
        let mut counts = BTreeMap::new();
        counts.insert(1u8, 10i32);
        counts.insert(2u8, 20i32);
        {
            let mut table = Any::from_mut(&mut counts).into_table().unwrap();
            table.at_mut(&Any::new(1u8)).unwrap().write(&Any::new(11i32)).unwrap();
            for (key, mut value) in table.iter_mut().unwrap() {
                assert!(key.is_const());
                *value.get_mut::<i32>().unwrap() += 1;
            }
        }
        assert_eq!(counts[&1], 12);
        assert_eq!(counts[&2], 21);
    }
}
