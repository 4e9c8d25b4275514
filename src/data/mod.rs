//! Capture preparation and synthetic capture generation.
//!
//! - `prepare`: ROI filtering, canonical ordering, decimation, optional
//!   statistical outlier removal, cardinality and degeneracy checks
//! - `synthetic`: seeded plane/line captures with noise and outliers

pub mod prepare;
pub mod synthetic;

pub use prepare::*;
pub use synthetic::*;
