//! Shape descriptors and views
//!
//! A shape is captured once when a type's record is built and stored as
//! plain function pointers, so code that only holds an [`Any`](crate::Any)
//! can still iterate, index or look up into the value.

pub mod range;
pub mod string;
pub mod table;
pub mod tuple;

pub use range::{AnyIter, AnyRange, BidirectionalRange, IterCategory, RandomAccessRange, RangeLike};
pub use string::StringLike;
pub use table::{AnyTable, AnyTableIter, TableLike};
pub use tuple::AnyTuple;

use range::RangeShape;
use string::StringShape;
use table::TableShape;
use tuple::TupleShape;

/// The optional shapes of one type
#[derive(Default)]
pub(crate) struct Shapes {
    pub range: Option<RangeShape>,
    pub table: Option<TableShape>,
    pub tuple: Option<TupleShape>,
    pub string: Option<StringShape>,
}
