//! Tuple shape: indexed access to a fixed set of fields

use core::fmt;
use core::ptr::NonNull;
use std::sync::Arc;

use crate::any::Any;
use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::TypeHandle;
use crate::type_info::TypeInfo;

type GetFn = Arc<dyn Fn(*const u8) -> *const u8 + Send + Sync>;
type GetMutFn = Arc<dyn Fn(*mut u8) -> *mut u8 + Send + Sync>;

/// One entry of the jump table
pub(crate) struct TupleSlot {
    ty: TypeHandle,
    get: GetFn,
    get_mut: GetMutFn,
}

impl TupleSlot {
    pub(crate) fn new<T, F, G, M>(get: G, get_mut: M) -> Self
    where
        T: Reflect,
        F: Reflect,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        Self {
            ty: TypeHandle::of::<F>(),
            // SAFETY: slots are only applied to live values of `T`.
            get: Arc::new(move |ptr: *const u8| unsafe {
                get(&*ptr.cast::<T>()) as *const F as *const u8
            }),
            get_mut: Arc::new(move |ptr: *mut u8| unsafe {
                get_mut(&mut *ptr.cast::<T>()) as *mut F as *mut u8
            }),
        }
    }
}

/// Tuple capability table of one type
pub(crate) struct TupleShape {
    slots: Vec<TupleSlot>,
}

impl TupleShape {
    pub(crate) fn new(slots: Vec<TupleSlot>) -> Self {
        Self { slots }
    }
}

/// Erased view of a tuple-shaped value
pub struct AnyTuple<'a> {
    shape: &'static TupleShape,
    target: Any<'a>,
}

impl<'a> AnyTuple<'a> {
    /// View `target` as a tuple
    pub fn new(target: Any<'a>) -> Result<Self> {
        let data = target.record().ok_or_else(|| Error::empty_any("view as tuple"))?;
        match &data.shapes.tuple {
            Some(shape) => Ok(Self { shape, target }),
            None => Err(Error::new(
                ErrorKind::InvalidType,
                format!("'{}' is not a tuple", data.name()),
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

    /// Number of fields
    pub fn len(&self) -> usize {
        self.shape.slots.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.shape.slots.is_empty()
    }

    /// Type of field `index`
    pub fn element_type(&self, index: usize) -> TypeInfo {
        self.shape
            .slots
            .get(index)
            .map(|slot| slot.ty.resolve())
            .unwrap_or_default()
    }

    /// Const reference to field `index`
    pub fn get(&self, index: usize) -> Result<Any<'_>> {
        let slot = self.slot(index)?;
        let ptr = self.target.raw_ptr().ok_or_else(|| Error::empty_any("index"))?;
        let field = (slot.get)(ptr.as_ptr());
        // SAFETY: the slot projects onto a field of the live target.
        Ok(unsafe { Any::from_parts(slot.ty.data(), NonNull::new_unchecked(field as *mut u8), true) })
    }

    /// Mutable reference to field `index`
    pub fn get_mut(&mut self, index: usize) -> Result<Any<'_>> {
        let shape = self.shape;
        let slot = shape.slots.get(index).ok_or_else(|| out_of_range(index))?;
        if self.target.is_const() {
            return Err(Error::new(
                ErrorKind::InvalidQualifier,
                format!("tuple '{}' is const", self.target.type_info().name()),
            ));
        }
        let ptr = self.target.raw_ptr_mut().ok_or_else(|| Error::empty_any("mutate"))?;
        let field = (slot.get_mut)(ptr.as_ptr());
        // SAFETY: exclusive access to the target is held for the result's lifetime.
        Ok(unsafe { Any::from_parts(slot.ty.data(), NonNull::new_unchecked(field), false) })
    }

    /// Iterate over const references to every field
    pub fn iter(&self) -> impl Iterator<Item = Any<'_>> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index).ok())
    }

    fn slot(&self, index: usize) -> Result<&'static TupleSlot> {
        self.shape.slots.get(index).ok_or_else(|| out_of_range(index))
    }
}

fn out_of_range(index: usize) -> Error {
    Error::invalid_param(0, format!("field index {} out of range", index))
}

impl fmt::Debug for AnyTuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("");
        for field in self.iter() {
            tuple.field(&field);
        }
        tuple.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_tuple_fields() {
        let mut pair = (3u8, "three".to_string());
        {
            let tuple = Any::from_ref(&pair).into_tuple().unwrap();
            assert_eq!(tuple.len(), 2);
            assert_eq!(tuple.element_type(1), TypeInfo::of::<String>());
            assert!(!tuple.element_type(2).is_valid());
            assert_eq!(tuple.get(0).unwrap().get::<u8>(), Some(&3));
            assert!(tuple.get(2).unwrap_err().is(ErrorKind::InvalidParam(0)));
        }
        {
            let mut tuple = Any::from_mut(&mut pair).into_tuple().unwrap();
            tuple.get_mut(0).unwrap().write(&Any::new(4u8)).unwrap();
        }
        assert_eq!(pair.0, 4);
    }

    #[test]
    fn test_field_address_matches() {
        let pair = (1i64, 2i64);
        let tuple = Any::from_ref(&pair).into_tuple().unwrap();
        let second = tuple.get(1).unwrap();
        assert_eq!(second.data(), Some(&pair.1 as *const i64 as *const u8));
    }
}
