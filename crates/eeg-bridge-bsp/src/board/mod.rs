//! Pin maps per board revision.
mod r1;

pub use r1::*;
