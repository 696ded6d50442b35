//! Conversion of Rust functions and closures into erased overloads
//!
//! Any `Fn` of up to four arguments becomes an [`Overload`]. Arguments are
//! taken by clone out of the argument `Any`s through a parent-aware cast;
//! a leading `&T` or `&mut T` receiver is borrowed from the first argument.
//! The marker type parameter only exists to keep the impls apart.

use core::marker::PhantomData;
use std::sync::Arc;

use crate::any::Any;
use crate::descriptor::Reflect;
use crate::error::{Error, Result};
use crate::handle::TypeHandle;
use crate::member::{ArgInfo, Overload};

/// A value that can be extracted from an argument `Any`
pub trait FromArg: Sized {
    /// Extract the argument at `index`
    fn from_arg(arg: &Any<'_>, index: usize) -> Result<Self>;

    /// Declared type of the argument
    fn arg_info() -> ArgInfo;
}

impl<T: Reflect + Clone> FromArg for T {
    fn from_arg(arg: &Any<'_>, index: usize) -> Result<Self> {
        arg.cast::<T>()
            .cloned()
            .map_err(|e| Error::invalid_param(index, e.message()))
    }

    fn arg_info() -> ArgInfo {
        ArgInfo::new(TypeHandle::of::<T>(), true)
    }
}

/// Something that can be registered as a function or constructor
pub trait IntoFunction<Marker>: Send + Sync + 'static {
    /// Return type
    type Output: Reflect;

    /// Erase into an overload
    fn into_overload(self) -> Overload;
}

/// Marker for functions taking `&T` first
pub struct RefMethod<T, F>(PhantomData<fn(T, F)>);

/// Marker for functions taking `&mut T` first
pub struct MutMethod<T, F>(PhantomData<fn(T, F)>);

fn arg<'s, 'a>(args: &'s [Any<'a>], index: usize) -> Result<&'s Any<'a>> {
    args.get(index)
        .ok_or_else(|| Error::invalid_param(index, "missing argument"))
}

macro_rules! impl_into_function {
    ($($arg:ident $index:tt),*) => {
        impl<F, R, $($arg,)*> IntoFunction<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg,)*) -> R + Send + Sync + 'static,
            R: Reflect,
            $($arg: FromArg,)*
        {
            type Output = R;

            #[allow(non_snake_case, unused_variables)]
            fn into_overload(self) -> Overload {
                Overload::new(
                    vec![$($arg::arg_info(),)*],
                    TypeHandle::of::<R>(),
                    Arc::new(move |args: &mut [Any<'_>]| {
                        let result = (self)($($arg::from_arg(arg(args, $index)?, $index)?,)*);
                        Ok(Any::new(result))
                    }),
                )
            }
        }

        impl<F, T, R, $($arg,)*> IntoFunction<RefMethod<T, fn($($arg,)*) -> R>> for F
        where
            F: Fn(&T, $($arg,)*) -> R + Send + Sync + 'static,
            T: Reflect,
            R: Reflect,
            $($arg: FromArg,)*
        {
            type Output = R;

            #[allow(non_snake_case, unused_variables)]
            fn into_overload(self) -> Overload {
                Overload::new(
                    vec![ArgInfo::new(TypeHandle::of::<T>(), true), $($arg::arg_info(),)*],
                    TypeHandle::of::<R>(),
                    Arc::new(move |args: &mut [Any<'_>]| {
                        let (this, rest) = args
                            .split_first()
                            .ok_or_else(|| Error::invalid_param(0, "missing receiver"))?;
                        let this = this
                            .cast::<T>()
                            .map_err(|e| Error::invalid_param(0, e.message()))?;
                        let result = (self)(this, $($arg::from_arg(arg(rest, $index)?, $index + 1)?,)*);
                        Ok(Any::new(result))
                    }),
                )
            }
        }

        impl<F, T, R, $($arg,)*> IntoFunction<MutMethod<T, fn($($arg,)*) -> R>> for F
        where
            F: Fn(&mut T, $($arg,)*) -> R + Send + Sync + 'static,
            T: Reflect,
            R: Reflect,
            $($arg: FromArg,)*
        {
            type Output = R;

            #[allow(non_snake_case, unused_variables)]
            fn into_overload(self) -> Overload {
                Overload::new(
                    vec![ArgInfo::new(TypeHandle::of::<T>(), false), $($arg::arg_info(),)*],
                    TypeHandle::of::<R>(),
                    Arc::new(move |args: &mut [Any<'_>]| {
                        let (this, rest) = args
                            .split_first_mut()
                            .ok_or_else(|| Error::invalid_param(0, "missing receiver"))?;
                        $(let $arg = $arg::from_arg(arg(rest, $index)?, $index + 1)?;)*
                        let this = this
                            .cast_mut::<T>()
                            .map_err(|e| Error::invalid_param(0, e.message()))?;
                        let result = (self)(this, $($arg,)*);
                        Ok(Any::new(result))
                    }),
                )
            }
        }
    };
}

impl_into_function!();
impl_into_function!(A0 0);
impl_into_function!(A0 0, A1 1);
impl_into_function!(A0 0, A1 1, A2 2);
impl_into_function!(A0 0, A1 1, A2 2, A3 3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn overload<M, F: IntoFunction<M>>(f: F) -> Overload {
        f.into_overload()
    }

    #[test]
    fn test_free_function() {
        let add = overload(|a: i32, b: i32| a + b);
        assert_eq!(add.arity(), 2);
        let result = add.invoke(&mut [Any::new(2), Any::new(3)]).unwrap();
        assert_eq!(result.get::<i32>(), Some(&5));
    }

    #[test]
    fn test_wrong_argument_type() {
        let negate = overload(|a: i32| -a);
        let err = negate.invoke(&mut [Any::new(2.0f32)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParam(0));
        assert!(!negate.accepts(&[Any::new(2.0f32)]));
        assert!(negate.accepts(&[Any::new(2i32)]));
    }

    #[test]
    fn test_mut_receiver() {
        let push = overload(|v: &mut Vec<u8>, x: u8| v.push(x));
        let mut values = vec![1u8];
        push.invoke(&mut [Any::from_mut(&mut values), Any::new(2u8)]).unwrap();
        assert_eq!(values, vec![1, 2]);

        // A const receiver does not bind to `&mut T`.
        let frozen = vec![1u8];
        assert!(!push.accepts(&[Any::from_ref(&frozen), Any::new(2u8)]));
    }

    #[test]
    fn test_ref_receiver() {
        let len = overload(|s: &String| s.len());
        let text = String::from("four");
        let result = len.invoke(&mut [Any::from_ref(&text)]).unwrap();
        assert_eq!(result.get::<usize>(), Some(&4));
    }
}
