//! Output nodes
//!
//! Sinks that format or export results.

mod file_sink;
mod print;

pub use file_sink::FileSink;
pub use print::Print;
