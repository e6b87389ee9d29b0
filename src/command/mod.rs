//! Command Module
//!
//! Line-oriented command driver over an ordered set of `(name, value)`
//! records. Only uses the public collection surface.
//!
//! ## Example Session
//! ```text
//! insert cat 2
//! insert cat 7
//! insert dog 1
//! find cat        -> 2 7
//! delete cat 2
//! find cat        -> 7
//! find cow        -> null
//! ```

mod interpreter;
mod parser;
mod record;

pub use interpreter::{Interpreter, RunSummary, NO_MATCH};
pub use parser::{parse_line, Command};
pub use record::{Record, NAME_CAPACITY};
