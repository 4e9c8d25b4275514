//! Input/output helpers for the `vfit` binary.
//!
//! - capture ingest from CSV/JSON (`ingest`)
//! - report/inlier/capture exports (`export`)
//!
//! The engine itself never touches the filesystem.

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
