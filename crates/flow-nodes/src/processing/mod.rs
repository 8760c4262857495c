//! Processing nodes
//!
//! Nodes that transform data.

mod arithmetic;
mod array;
mod signal;
mod string;

pub use arithmetic::{Operation, Operator};
pub use array::{
    ArrayAppend, ArrayExtreme, ArrayLength, ArrayRemove, IndexToValue, PackArray, UnpackArray,
    ValueToIndex,
};
pub use signal::{DbmToWatt, WattToDbm};
pub use string::{DictToStr, StrReplace, StrSplit, StrToDict};
