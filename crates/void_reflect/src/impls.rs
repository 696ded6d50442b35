//! Reflect implementations for std types
//!
//! Container capabilities (clone, equality, ordering, debug) are derived at
//! runtime from the element records, so `Vec<T>` is copyable exactly when
//! `T`'s record is. Keys of sets and maps need their traits statically.

use core::cmp::Ordering;
use core::fmt;
use core::hash::Hash;
use core::mem::MaybeUninit;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::descriptor::{Descriptor, Reflect};
use crate::shape::range::{BidirectionalRange, RandomAccessRange, RangeLike};
use crate::shape::string::StringLike;
use crate::shape::table::TableLike;
use crate::type_data::{TypeData, TypeFlags, ValueVTable};

fn vtable<T: Reflect>() -> ValueVTable {
    TypeData::of::<T>().vtable
}

fn type_name<T: Reflect>() -> &'static str {
    TypeData::of::<T>().name()
}

// Element thunks. Container thunks are only installed when the element
// record has the matching capability.

unsafe fn elem_clone<T: Reflect>(value: &T) -> T {
    let Some(clone) = vtable::<T>().clone else {
        unreachable!("clone thunk installed for a non-copyable element");
    };
    let mut out = MaybeUninit::<T>::uninit();
    clone((value as *const T).cast(), out.as_mut_ptr().cast());
    out.assume_init()
}

unsafe fn elem_eq<T: Reflect>(a: &T, b: &T) -> bool {
    match vtable::<T>().eq {
        Some(eq) => eq((a as *const T).cast(), (b as *const T).cast()),
        None => false,
    }
}

unsafe fn elem_cmp<T: Reflect>(a: &T, b: &T) -> Option<Ordering> {
    vtable::<T>().cmp.and_then(|cmp| cmp((a as *const T).cast(), (b as *const T).cast()))
}

/// Debug formats an element through its record
struct ElemDebug<'a, T>(&'a T);

impl<T: Reflect> fmt::Debug for ElemDebug<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match vtable::<T>().debug {
            // SAFETY: the pointer comes from a live `T`.
            Some(debug) => unsafe { debug((self.0 as *const T).cast(), f) },
            None => write!(f, "<{}>", type_name::<T>()),
        }
    }
}

unsafe fn seq_eq<'a, T: Reflect>(
    mut a: impl Iterator<Item = &'a T>,
    mut b: impl Iterator<Item = &'a T>,
) -> bool {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if elem_eq(x, y) => {}
            _ => return false,
        }
    }
}

unsafe fn seq_cmp<'a, T: Reflect>(
    mut a: impl Iterator<Item = &'a T>,
    mut b: impl Iterator<Item = &'a T>,
) -> Option<Ordering> {
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Some(Ordering::Equal),
            (None, Some(_)) => return Some(Ordering::Less),
            (Some(_), None) => return Some(Ordering::Greater),
            (Some(x), Some(y)) => match elem_cmp(x, y)? {
                Ordering::Equal => {}
                ordering => return Some(ordering),
            },
        }
    }
}

/// A range that can be rebuilt item by item
trait Sequence: RangeLike {
    fn map_items(&self, f: impl FnMut(&Self::Item) -> Self::Item) -> Self;
}

unsafe fn seq_clone_thunk<C: Sequence>(src: *const u8, dst: *mut u8) {
    let src = &*src.cast::<C>();
    dst.cast::<C>().write(src.map_items(|item| elem_clone(item)));
}

unsafe fn seq_eq_thunk<C: RangeLike>(a: *const u8, b: *const u8) -> bool {
    seq_eq((*a.cast::<C>()).range_iter(), (*b.cast::<C>()).range_iter())
}

unsafe fn seq_cmp_thunk<C: RangeLike>(a: *const u8, b: *const u8) -> Option<Ordering> {
    seq_cmp((*a.cast::<C>()).range_iter(), (*b.cast::<C>()).range_iter())
}

unsafe fn list_debug_thunk<C: RangeLike>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
        .entries((*value.cast::<C>()).range_iter().map(ElemDebug))
        .finish()
}

unsafe fn set_debug_thunk<C: RangeLike>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set()
        .entries((*value.cast::<C>()).range_iter().map(ElemDebug))
        .finish()
}

/// Install every capability the item record supports
fn sequence_capabilities<C: Sequence>(d: &mut Descriptor<C>) {
    let item = vtable::<C::Item>();
    if item.clone.is_some() {
        d.set_clone(seq_clone_thunk::<C>);
    }
    if item.eq.is_some() {
        d.set_eq(seq_eq_thunk::<C>);
    }
    if item.cmp.is_some() {
        d.set_cmp(seq_cmp_thunk::<C>);
    }
    if item.debug.is_some() {
        d.set_debug(list_debug_thunk::<C>);
    }
}

// Primitives

macro_rules! impl_plain {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Reflect for $ty {
            fn describe(d: &mut Descriptor<Self>) {
                d.name($name)
                    .copyable()
                    .comparable()
                    .ordered()
                    .debuggable()
                    .default_constructible();
            }
        }
    )*};
}

impl_plain! {
    () => "()",
    bool => "bool",
}

impl Reflect for char {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("char")
            .copyable()
            .comparable()
            .ordered()
            .debuggable()
            .default_constructible()
            .conversion(|c: &char| *c as u32);
    }
}

macro_rules! impl_numeric {
    ($($ty:ident => $flags:expr),* $(,)?) => {$(
        impl Reflect for $ty {
            fn describe(d: &mut Descriptor<Self>) {
                d.name(stringify!($ty))
                    .flags($flags)
                    .copyable()
                    .comparable()
                    .ordered()
                    .debuggable()
                    .default_constructible()
                    .convert_as::<i8>()
                    .convert_as::<i16>()
                    .convert_as::<i32>()
                    .convert_as::<i64>()
                    .convert_as::<i128>()
                    .convert_as::<isize>()
                    .convert_as::<u8>()
                    .convert_as::<u16>()
                    .convert_as::<u32>()
                    .convert_as::<u64>()
                    .convert_as::<u128>()
                    .convert_as::<usize>()
                    .convert_as::<f32>()
                    .convert_as::<f64>();
            }
        }
    )*};
}

impl_numeric! {
    i8 => TypeFlags::SIGNED,
    i16 => TypeFlags::SIGNED,
    i32 => TypeFlags::SIGNED,
    i64 => TypeFlags::SIGNED,
    i128 => TypeFlags::SIGNED,
    isize => TypeFlags::SIGNED,
    u8 => TypeFlags::UNSIGNED,
    u16 => TypeFlags::UNSIGNED,
    u32 => TypeFlags::UNSIGNED,
    u64 => TypeFlags::UNSIGNED,
    u128 => TypeFlags::UNSIGNED,
    usize => TypeFlags::UNSIGNED,
    f32 => TypeFlags::FLOATING,
    f64 => TypeFlags::FLOATING,
}

// Strings

impl Reflect for String {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("String")
            .copyable()
            .comparable()
            .ordered()
            .debuggable()
            .default_constructible()
            .string();
    }
}

impl StringLike for String {
    fn str_view(&self) -> &str {
        self
    }

    fn assign_str(&mut self, value: &str) -> bool {
        self.clear();
        self.push_str(value);
        true
    }
}

impl Reflect for &'static str {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("&str")
            .copyable()
            .comparable()
            .ordered()
            .debuggable()
            .default_constructible()
            .string()
            .conversion(|s: &&'static str| s.to_string());
    }
}

impl StringLike for &'static str {
    fn str_view(&self) -> &str {
        self
    }
}

// Sequences

impl<T: Reflect> Reflect for Vec<T> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("Vec<{}>", type_name::<T>()))
            .default_constructible()
            .random_access_range();
        sequence_capabilities(d);
    }
}

impl<T: Reflect> RangeLike for Vec<T> {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> BidirectionalRange for Vec<T> {
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_double_mut(&mut self) -> Option<Box<dyn DoubleEndedIterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> RandomAccessRange for Vec<T> {
    fn range_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn range_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

impl<T: Reflect> Sequence for Vec<T> {
    fn map_items(&self, f: impl FnMut(&T) -> T) -> Self {
        self.iter().map(f).collect()
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("VecDeque<{}>", type_name::<T>()))
            .default_constructible()
            .random_access_range();
        sequence_capabilities(d);
    }
}

impl<T: Reflect> RangeLike for VecDeque<T> {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> BidirectionalRange for VecDeque<T> {
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_double_mut(&mut self) -> Option<Box<dyn DoubleEndedIterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> RandomAccessRange for VecDeque<T> {
    fn range_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn range_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    fn map_items(&self, f: impl FnMut(&T) -> T) -> Self {
        self.iter().map(f).collect()
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("[{}; {}]", type_name::<T>(), N))
            .random_access_range();
        sequence_capabilities(d);
    }
}

impl<T: Reflect, const N: usize> RangeLike for [T; N] {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(N)
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect, const N: usize> BidirectionalRange for [T; N] {
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_double_mut(&mut self) -> Option<Box<dyn DoubleEndedIterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect, const N: usize> RandomAccessRange for [T; N] {
    fn range_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn range_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.get_mut(index)
    }
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
    fn map_items(&self, mut f: impl FnMut(&T) -> T) -> Self {
        core::array::from_fn(|index| f(&self[index]))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("Option<{}>", type_name::<T>()))
            .default_constructible()
            .bidirectional_range();
        sequence_capabilities(d);
        if vtable::<T>().debug.is_some() {
            d.set_debug(option_debug_thunk::<T>);
        }
    }
}

unsafe fn option_debug_thunk<T: Reflect>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &*value.cast::<Option<T>>() {
        Some(inner) => f.debug_tuple("Some").field(&ElemDebug(inner)).finish(),
        None => write!(f, "None"),
    }
}

impl<T: Reflect> RangeLike for Option<T> {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(usize::from(self.is_some()))
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> BidirectionalRange for Option<T> {
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn range_iter_double_mut(&mut self) -> Option<Box<dyn DoubleEndedIterator<Item = &mut T> + '_>> {
        Some(Box::new(self.iter_mut()))
    }
}

impl<T: Reflect> Sequence for Option<T> {
    fn map_items(&self, f: impl FnMut(&T) -> T) -> Self {
        self.as_ref().map(f)
    }
}

// Sets

impl<T: Reflect + Clone + Eq + Hash> Reflect for HashSet<T> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("HashSet<{}>", type_name::<T>()))
            .copyable()
            .comparable()
            .default_constructible()
            .range();
        if vtable::<T>().debug.is_some() {
            d.set_debug(set_debug_thunk::<Self>);
        }
    }
}

impl<T: Reflect + Clone + Eq + Hash> RangeLike for HashSet<T> {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

impl<T: Reflect + Clone + Ord> Reflect for BTreeSet<T> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("BTreeSet<{}>", type_name::<T>()))
            .copyable()
            .comparable()
            .ordered()
            .default_constructible()
            .bidirectional_range();
        if vtable::<T>().debug.is_some() {
            d.set_debug(set_debug_thunk::<Self>);
        }
    }
}

impl<T: Reflect + Clone + Ord> RangeLike for BTreeSet<T> {
    type Item = T;

    fn range_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn range_iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

impl<T: Reflect + Clone + Ord> BidirectionalRange for BTreeSet<T> {
    fn range_iter_double(&self) -> Box<dyn DoubleEndedIterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

// Maps

unsafe fn map_debug_thunk<C: TableLike>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
        .entries(
            (*value.cast::<C>())
                .table_iter()
                .map(|(key, value)| (ElemDebug(key), ElemDebug(value))),
        )
        .finish()
}

impl<K: Reflect + Clone + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("HashMap<{}, {}>", type_name::<K>(), type_name::<V>()))
            .default_constructible()
            .table();
        let value = vtable::<V>();
        if value.clone.is_some() {
            d.set_clone(hash_map_clone::<K, V>);
        }
        if value.eq.is_some() {
            d.set_eq(hash_map_eq::<K, V>);
        }
        if value.debug.is_some() && vtable::<K>().debug.is_some() {
            d.set_debug(map_debug_thunk::<Self>);
        }
    }
}

unsafe fn hash_map_clone<K: Reflect + Clone + Eq + Hash, V: Reflect>(src: *const u8, dst: *mut u8) {
    let src = &*src.cast::<HashMap<K, V>>();
    let copy: HashMap<K, V> = src
        .iter()
        .map(|(key, value)| (key.clone(), elem_clone(value)))
        .collect();
    dst.cast::<HashMap<K, V>>().write(copy);
}

unsafe fn hash_map_eq<K: Reflect + Clone + Eq + Hash, V: Reflect>(a: *const u8, b: *const u8) -> bool {
    let (a, b) = (&*a.cast::<HashMap<K, V>>(), &*b.cast::<HashMap<K, V>>());
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).map_or(false, |other| elem_eq(value, other)))
}

impl<K: Reflect + Clone + Eq + Hash, V: Reflect> TableLike for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn table_len(&self) -> usize {
        self.len()
    }

    fn table_iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn table_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = (&K, &mut V)> + '_>> {
        Some(Box::new(self.iter_mut()))
    }

    fn table_find(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn table_find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }
}

impl<K: Reflect + Clone + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe(d: &mut Descriptor<Self>) {
        d.name(&format!("BTreeMap<{}, {}>", type_name::<K>(), type_name::<V>()))
            .default_constructible()
            .table();
        let value = vtable::<V>();
        if value.clone.is_some() {
            d.set_clone(btree_map_clone::<K, V>);
        }
        if value.eq.is_some() {
            d.set_eq(btree_map_eq::<K, V>);
        }
        if value.cmp.is_some() {
            d.set_cmp(btree_map_cmp::<K, V>);
        }
        if value.debug.is_some() && vtable::<K>().debug.is_some() {
            d.set_debug(map_debug_thunk::<Self>);
        }
    }
}

unsafe fn btree_map_clone<K: Reflect + Clone + Ord, V: Reflect>(src: *const u8, dst: *mut u8) {
    let src = &*src.cast::<BTreeMap<K, V>>();
    let copy: BTreeMap<K, V> = src
        .iter()
        .map(|(key, value)| (key.clone(), elem_clone(value)))
        .collect();
    dst.cast::<BTreeMap<K, V>>().write(copy);
}

unsafe fn btree_map_eq<K: Reflect + Clone + Ord, V: Reflect>(a: *const u8, b: *const u8) -> bool {
    let (a, b) = (&*a.cast::<BTreeMap<K, V>>(), &*b.cast::<BTreeMap<K, V>>());
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && elem_eq(va, vb))
}

unsafe fn btree_map_cmp<K: Reflect + Clone + Ord, V: Reflect>(a: *const u8, b: *const u8) -> Option<Ordering> {
    let (a, b) = (&*a.cast::<BTreeMap<K, V>>(), &*b.cast::<BTreeMap<K, V>>());
    let (mut a, mut b) = (a.iter(), b.iter());
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Some(Ordering::Equal),
            (None, Some(_)) => return Some(Ordering::Less),
            (Some(_), None) => return Some(Ordering::Greater),
            (Some((ka, va)), Some((kb, vb))) => match ka.cmp(kb) {
                Ordering::Equal => match elem_cmp(va, vb)? {
                    Ordering::Equal => {}
                    ordering => return Some(ordering),
                },
                ordering => return Some(ordering),
            },
        }
    }
}

impl<K: Reflect + Clone + Ord, V: Reflect> TableLike for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn table_len(&self) -> usize {
        self.len()
    }

    fn table_iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn table_iter_mut(&mut self) -> Option<Box<dyn Iterator<Item = (&K, &mut V)> + '_>> {
        Some(Box::new(self.iter_mut()))
    }

    fn table_find(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn table_find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.get_mut(key)
    }
}

// Tuples

macro_rules! impl_tuple {
    ($($elem:ident $index:tt),+) => {
        impl<$($elem: Reflect),+> Reflect for ($($elem,)+) {
            fn describe(d: &mut Descriptor<Self>) {
                let names = [$(type_name::<$elem>()),+];
                d.name(&format!("({})", names.join(", ")));
                $(d.field(|t: &Self| &t.$index, |t: &mut Self| &mut t.$index);)+

                unsafe fn clone<$($elem: Reflect),+>(src: *const u8, dst: *mut u8) {
                    let src = &*src.cast::<($($elem,)+)>();
                    dst.cast::<($($elem,)+)>().write(($(elem_clone(&src.$index),)+));
                }

                unsafe fn eq<$($elem: Reflect),+>(a: *const u8, b: *const u8) -> bool {
                    let (a, b) = (&*a.cast::<($($elem,)+)>(), &*b.cast::<($($elem,)+)>());
                    $(elem_eq(&a.$index, &b.$index))&&+
                }

                unsafe fn cmp<$($elem: Reflect),+>(a: *const u8, b: *const u8) -> Option<Ordering> {
                    let (a, b) = (&*a.cast::<($($elem,)+)>(), &*b.cast::<($($elem,)+)>());
                    $(match elem_cmp(&a.$index, &b.$index)? {
                        Ordering::Equal => {}
                        ordering => return Some(ordering),
                    })+
                    Some(Ordering::Equal)
                }

                unsafe fn debug<$($elem: Reflect),+>(value: *const u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let value = &*value.cast::<($($elem,)+)>();
                    let mut tuple = f.debug_tuple("");
                    $(tuple.field(&ElemDebug(&value.$index));)+
                    tuple.finish()
                }

                let vtables = [$(vtable::<$elem>()),+];
                if vtables.iter().all(|v| v.clone.is_some()) {
                    d.set_clone(clone::<$($elem),+>);
                }
                if vtables.iter().all(|v| v.eq.is_some()) {
                    d.set_eq(eq::<$($elem),+>);
                }
                if vtables.iter().all(|v| v.cmp.is_some()) {
                    d.set_cmp(cmp::<$($elem),+>);
                }
                if vtables.iter().all(|v| v.debug.is_some()) {
                    d.set_debug(debug::<$($elem),+>);
                }
            }
        }
    };
}

impl_tuple!(A 0);
impl_tuple!(A 0, B 1);
impl_tuple!(A 0, B 1, C 2);
impl_tuple!(A 0, B 1, C 2, D 3);

#[cfg(test)]
mod tests {
    use crate::{Any, TypeInfo};
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_names() {
        assert_eq!(TypeInfo::of::<i32>().name(), "i32");
        assert_eq!(TypeInfo::of::<Vec<String>>().name(), "Vec<String>");
        assert_eq!(TypeInfo::of::<(u8, bool)>().name(), "(u8, bool)");
        assert_eq!(TypeInfo::of::<[f32; 3]>().name(), "[f32; 3]");
        assert_eq!(TypeInfo::of::<HashMap<String, u32>>().name(), "HashMap<String, u32>");
    }

    #[test]
    fn test_container_capabilities_follow_elements() {
        struct Opaque;
        impl crate::Reflect for Opaque {}

        assert!(TypeInfo::of::<Vec<i32>>().is_copyable());
        assert!(TypeInfo::of::<Vec<i32>>().is_ordered());
        assert!(!TypeInfo::of::<Vec<Opaque>>().is_copyable());
        assert!(!TypeInfo::of::<Vec<Opaque>>().is_comparable());
        assert!(!TypeInfo::of::<(i32, Opaque)>().is_copyable());
        assert!(TypeInfo::of::<Option<String>>().is_copyable());
    }

    #[test]
    fn test_container_values() {
        let list = Any::new(vec![(1u8, "a".to_string()), (2u8, "b".to_string())]);
        let copy = list.try_clone().unwrap();
        assert_eq!(copy, list);
        assert_eq!(format!("{:?}", list), r#"[(1, "a"), (2, "b")]"#);

        let mut map = BTreeMap::new();
        map.insert(1u8, vec![1.5f32]);
        let map = Any::new(map);
        assert_eq!(map.try_clone().unwrap(), map);
        assert_eq!(format!("{:?}", map), "{1: [1.5]}");

        assert_eq!(format!("{:?}", Any::new(Some(3i64))), "Some(3)");
        assert!(Any::new(vec![1, 2]) < Any::new(vec![1, 3]));
    }

    #[test]
    fn test_numeric_conversions() {
        let value = Any::new(300i32);
        assert_eq!(value.conv(TypeInfo::of::<u8>()).get::<u8>(), Some(&44));
        assert_eq!(value.conv(TypeInfo::of::<f32>()).get::<f32>(), Some(&300.0));
        let text = Any::new("hello");
        assert_eq!(text.conv(TypeInfo::of::<String>()).get::<String>().map(String::as_str), Some("hello"));
    }
}
