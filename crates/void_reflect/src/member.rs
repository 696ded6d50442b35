//! Member records: constructors, parents, conversions, constants,
//! properties and functions

use core::fmt;
use core::ptr::NonNull;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::any::Any;
use crate::attribute::Attributes;
use crate::descriptor::Reflect;
use crate::error::{Error, ErrorKind, Result};
use crate::handle::TypeHandle;
use crate::type_data::ConvertFn;
use crate::type_info::TypeInfo;

/// Erased call: arguments in, owned result out
pub type InvokeFn = Arc<dyn Fn(&mut [Any<'_>]) -> Result<Any<'static>> + Send + Sync>;

/// Declared type and mutability of one argument
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgInfo {
    ty: TypeHandle,
    is_const: bool,
}

impl ArgInfo {
    /// Create argument info
    pub const fn new(ty: TypeHandle, is_const: bool) -> Self {
        Self { ty, is_const }
    }

    /// Argument type
    pub fn type_info(&self) -> TypeInfo {
        self.ty.resolve()
    }

    /// Whether a const reference is enough
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Check whether an argument value can bind to this parameter
    pub fn accepts(&self, arg: &Any<'_>) -> bool {
        if arg.is_empty() || (!self.is_const && arg.is_const()) {
            return false;
        }
        let expected = self.type_info();
        let found = arg.type_info();
        found == expected || found.inherits(expected)
    }
}

impl fmt::Debug for ArgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "&{}", self.ty.data().name())
        } else {
            write!(f, "&mut {}", self.ty.data().name())
        }
    }
}

/// One callable signature: a constructor or a function overload
#[derive(Clone)]
pub struct Overload {
    args: Vec<ArgInfo>,
    ret: TypeHandle,
    invoke: InvokeFn,
    attributes: Attributes,
}

impl Overload {
    /// Create an overload from its signature and thunk
    pub fn new(args: Vec<ArgInfo>, ret: TypeHandle, invoke: InvokeFn) -> Self {
        Self {
            args,
            ret,
            invoke,
            attributes: Attributes::new(),
        }
    }

    /// Declared arguments
    pub fn args(&self) -> &[ArgInfo] {
        &self.args
    }

    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Return type
    pub fn return_type(&self) -> TypeInfo {
        self.ret.resolve()
    }

    /// Structural match of argument count, types and mutability
    pub fn accepts(&self, args: &[Any<'_>]) -> bool {
        args.len() == self.args.len()
            && self.args.iter().zip(args).all(|(info, arg)| info.accepts(arg))
    }

    /// Call the overload
    pub fn invoke(&self, args: &mut [Any<'_>]) -> Result<Any<'static>> {
        if args.len() != self.args.len() {
            return Err(Error::invalid_param(
                args.len().min(self.args.len()),
                format!("expected {} arguments, found {}", self.args.len(), args.len()),
            ));
        }
        (self.invoke)(args)
    }

    /// Attributes attached to this overload
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Typed attribute lookup
    pub fn get_attribute<A: Reflect>(&self) -> Option<Arc<A>> {
        self.attributes.get::<A>()
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        write!(f, ") -> {}", self.ret.data().name())
    }
}

/// A named constant value
#[derive(Clone)]
pub struct ConstantInfo {
    name: String,
    value: Arc<Any<'static>>,
    attributes: Attributes,
}

impl ConstantInfo {
    pub(crate) fn new(name: &str, value: Any<'static>) -> Self {
        Self {
            name: name.to_string(),
            value: Arc::new(value),
            attributes: Attributes::new(),
        }
    }

    /// Constant name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Const reference to the value
    pub fn value(&self) -> Any<'_> {
        Any::as_ref(&self.value)
    }

    /// Type of the value
    pub fn type_info(&self) -> TypeInfo {
        self.value.type_info()
    }

    /// Attributes attached to this constant
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Typed attribute lookup
    pub fn get_attribute<A: Reflect>(&self) -> Option<Arc<A>> {
        self.attributes.get::<A>()
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl fmt::Debug for ConstantInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantInfo")
            .field("name", &self.name)
            .field("value", &*self.value)
            .finish()
    }
}

/// Reads a property from an instance
pub type GetterFn = Arc<dyn Fn(&Any<'_>) -> Result<Any<'static>> + Send + Sync>;
/// Writes a property on an instance
pub type SetterFn = Arc<dyn Fn(&mut Any<'_>, &Any<'_>) -> Result<()> + Send + Sync>;

/// A named property with a getter and optional setter
#[derive(Clone)]
pub struct PropertyInfo {
    name: String,
    ty: TypeHandle,
    get: GetterFn,
    set: Option<SetterFn>,
    attributes: Attributes,
}

impl PropertyInfo {
    pub(crate) fn new<T, V, G>(name: &str, get: G) -> Self
    where
        T: Reflect,
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let property = name.to_string();
        let getter: GetterFn = Arc::new(move |instance: &Any<'_>| {
            let this = instance
                .cast::<T>()
                .map_err(|e| Error::new(ErrorKind::InvalidProperty, format!("{}: {}", property, e.message())))?;
            Ok(Any::new(get(this)))
        });
        Self {
            name: name.to_string(),
            ty: TypeHandle::of::<V>(),
            get: getter,
            set: None,
            attributes: Attributes::new(),
        }
    }

    pub(crate) fn with_setter<T, V, S>(mut self, set: S) -> Self
    where
        T: Reflect,
        V: Reflect + Clone,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let property = self.name.clone();
        let setter: SetterFn = Arc::new(move |instance: &mut Any<'_>, value: &Any<'_>| {
            let converted;
            let value = if value.type_info() == TypeInfo::of::<V>() || value.type_info().inherits(TypeInfo::of::<V>()) {
                value.cast::<V>()?
            } else {
                converted = value.try_conv(TypeInfo::of::<V>())?;
                converted.cast::<V>()?
            }
            .clone();
            let this = instance
                .cast_mut::<T>()
                .map_err(|e| Error::new(e.kind(), format!("{}: {}", property, e.message())))?;
            set(this, value);
            Ok(())
        });
        self.set = Some(setter);
        self
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property value type
    pub fn type_info(&self) -> TypeInfo {
        self.ty.resolve()
    }

    /// Whether the property has no setter
    pub fn is_readonly(&self) -> bool {
        self.set.is_none()
    }

    /// Read the property from an instance
    pub fn get(&self, instance: &Any<'_>) -> Result<Any<'static>> {
        (self.get)(instance)
    }

    /// Write the property on an instance, converting the value if needed
    pub fn set(&self, instance: &mut Any<'_>, value: &Any<'_>) -> Result<()> {
        match &self.set {
            Some(set) => set(instance, value),
            None => Err(Error::new(
                ErrorKind::InvalidProperty,
                format!("property '{}' is read-only", self.name),
            )),
        }
    }

    /// Attributes attached to this property
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Typed attribute lookup
    pub fn get_attribute<A: Reflect>(&self) -> Option<Arc<A>> {
        self.attributes.get::<A>()
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("type", &self.ty)
            .field("readonly", &self.is_readonly())
            .finish()
    }
}

/// A named function and its overloads, in registration order
#[derive(Clone, Debug)]
pub struct FunctionInfo {
    name: String,
    overloads: Vec<Overload>,
}

impl FunctionInfo {
    pub(crate) fn new(name: &str, overloads: Vec<Overload>) -> Self {
        Self {
            name: name.to_string(),
            overloads,
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All overloads
    pub fn overloads(&self) -> &[Overload] {
        &self.overloads
    }

    /// Call the first overload that accepts the arguments
    pub fn invoke(&self, args: &mut [Any<'_>]) -> Result<Any<'static>> {
        match self.overloads.iter().find(|overload| overload.accepts(args)) {
            Some(overload) => overload.invoke(args),
            None => Err(Error::new(
                ErrorKind::InvalidFunction,
                format!(
                    "no overload of '{}' accepts ({})",
                    self.name,
                    describe_args(args)
                ),
            )),
        }
    }
}

/// Comma separated argument type names, for error messages
pub(crate) fn describe_args(args: &[Any<'_>]) -> String {
    args.iter()
        .map(|arg| arg.type_info().name().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

type UpcastFn = Arc<dyn Fn(*const u8) -> *const u8 + Send + Sync>;
type UpcastMutFn = Arc<dyn Fn(*mut u8) -> *mut u8 + Send + Sync>;

/// A declared base type and the projections that reach it
#[derive(Clone)]
pub(crate) struct ParentCast {
    pub parent: TypeHandle,
    upcast: UpcastFn,
    upcast_mut: UpcastMutFn,
}

impl ParentCast {
    pub(crate) fn new<T, B, U, M>(upcast: U, upcast_mut: M) -> Self
    where
        T: Reflect,
        B: Reflect,
        U: Fn(&T) -> &B + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
    {
        Self {
            parent: TypeHandle::of::<B>(),
            // SAFETY: callers only pass pointers to live values of `T`.
            upcast: Arc::new(move |ptr: *const u8| unsafe {
                upcast(&*ptr.cast::<T>()) as *const B as *const u8
            }),
            upcast_mut: Arc::new(move |ptr: *mut u8| unsafe {
                upcast_mut(&mut *ptr.cast::<T>()) as *mut B as *mut u8
            }),
        }
    }

    /// Project a pointer to the child onto the parent sub-object
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live value of the child type, and if `mutable`
    /// is set the caller must hold exclusive access to it.
    pub(crate) unsafe fn apply(&self, ptr: NonNull<u8>, mutable: bool) -> Option<NonNull<u8>> {
        if mutable {
            NonNull::new((self.upcast_mut)(ptr.as_ptr()))
        } else {
            NonNull::new((self.upcast)(ptr.as_ptr()) as *mut u8)
        }
    }
}

/// A declared or derived value conversion
#[derive(Clone)]
pub(crate) struct Conversion {
    pub target: TypeHandle,
    pub convert: ConvertFn,
}

impl Conversion {
    pub(crate) fn new<T, U, F>(convert: F) -> Self
    where
        T: Reflect,
        U: Reflect,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        Self {
            target: TypeHandle::of::<U>(),
            // SAFETY: callers only pass pointers to live values of `T`.
            convert: Arc::new(move |ptr: *const u8| Any::new(convert(unsafe { &*ptr.cast::<T>() }))),
        }
    }
}

/// The mutable half of a type record
#[derive(Clone, Default)]
pub(crate) struct Members {
    pub constructors: Vec<Overload>,
    pub parents: Vec<ParentCast>,
    pub conversions: Vec<Conversion>,
    pub constants: BTreeMap<String, ConstantInfo>,
    pub properties: BTreeMap<String, PropertyInfo>,
    pub functions: BTreeMap<String, Vec<Overload>>,
    pub attributes: Attributes,
}

impl Members {
    /// Append a function overload, returning its index
    pub(crate) fn add_function(&mut self, name: &str, overload: Overload) -> usize {
        let overloads = self.functions.entry(name.to_string()).or_default();
        overloads.push(overload);
        overloads.len() - 1
    }
}
