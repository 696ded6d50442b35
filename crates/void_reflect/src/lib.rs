//! # void_reflect - Void Engine Runtime Reflection
//!
//! Type erasure and runtime reflection for engine modules:
//! - **Records**: one lazily built metadata record per Rust type, with
//!   constructors, functions, constants, properties, parents, conversions
//!   and attributes
//! - **Any**: a type-erased value holder that owns small values inline and
//!   can also borrow
//! - **Shapes**: structural range/table/tuple/string access without knowing
//!   the concrete type
//! - **Database**: a process-wide registry of named types with incremental
//!   queries
//!
//! ## Example
//! ```ignore
//! use void_reflect::prelude::*;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl Reflect for Point {
//!     fn describe(d: &mut Descriptor<Self>) {
//!         d.name("Point").copyable().comparable().debuggable().default_constructible();
//!     }
//! }
//!
//! TypeInfo::reflect::<Point>().constant("ORIGIN", Point::default());
//!
//! let origin = TypeInfo::get("Point").constant("ORIGIN").unwrap();
//! assert_eq!(origin.value().cast::<Point>().unwrap().x, 0);
//! ```

pub mod any;
pub mod attribute;
pub mod database;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod factory;
pub mod function;
pub mod guard;
pub mod handle;
pub mod member;
pub mod query;
pub mod shape;
pub mod type_data;
pub mod type_info;

mod impls;

pub use any::Any;
pub use attribute::{AttributeValue, Attributes};
pub use database::TypeDatabase;
pub use descriptor::{Descriptor, Reflect};
pub use enums::{enum_from_string, enum_to_string};
pub use error::{Error, ErrorKind, Result};
pub use factory::TypeFactory;
pub use function::{FromArg, IntoFunction, MutMethod, RefMethod};
pub use guard::{AccessGuard, Guarded, GuardedMut};
pub use handle::TypeHandle;
pub use member::{ArgInfo, ConstantInfo, FunctionInfo, Overload, PropertyInfo};
pub use query::TypeQuery;
pub use shape::{
    AnyIter, AnyRange, AnyTable, AnyTableIter, AnyTuple, BidirectionalRange, IterCategory,
    RandomAccessRange, RangeLike, StringLike, TableLike,
};
pub use type_data::{TypeData, TypeFlags};
pub use type_info::{type_name, TypeInfo};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::any::Any;
    pub use crate::database::TypeDatabase;
    pub use crate::descriptor::{Descriptor, Reflect};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::shape::{AnyRange, AnyTable, AnyTuple};
    pub use crate::type_info::TypeInfo;
}
