//! Refine loop runner.
//!
//! - RefineLoop for driving generate/verify iterations
//! - Reporter for printing each iteration as it happens

mod refine_loop;
mod reporter;

pub use refine_loop::{RefineLoop, RefineLoopConfig};
pub use reporter::{ConsoleReporter, NoOpReporter, Reporter};
