//! Reporting: quality assessment and formatted terminal output.

pub mod format;
pub mod quality;

pub use format::*;
pub use quality::*;
