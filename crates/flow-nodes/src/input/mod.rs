//! Input nodes
//!
//! Sources that bring data into a graph.

mod constant;
mod file_source;
mod range;

pub use constant::{BooleanSource, FloatSource, IntegerSource, StringSource};
pub use file_source::FileSource;
pub use range::RangeSource;
