//! Geometric primitive implementations.
//!
//! Primitives are small value types with pure per-kind functions so the RANSAC
//! and refinement code can stay generic over lines and planes.

pub mod primitive;

pub use primitive::*;
