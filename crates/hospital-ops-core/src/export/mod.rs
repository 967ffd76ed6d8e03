//! Export functionality for bill statements.

mod statement;

pub use statement::*;
