//! Cache-side halves of a resolution: matching stored entries, judging their freshness, and
//! committing exchange outcomes back into the store.

pub mod freshness;
pub mod matcher;
pub mod writer;

pub use freshness::*;
pub use matcher::*;
pub use writer::*;
