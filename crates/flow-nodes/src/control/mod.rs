//! Control nodes
//!
//! Nodes that shape the flow of data over iterations.

mod replicate;

pub use replicate::{Pause, Replicate, Trigger};
