//! `valve-fit` library crate.
//!
//! Fits a line or plane to a 3D capture of a valve component with RANSAC and
//! total least squares, then reports its pitch/roll against an up reference.
//!
//! The binary (`vfit`) is a thin wrapper around this library so that:
//!
//! - the engine is testable without spawning processes
//! - the engine (`engine::fit`) stays free of I/O and logging

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod orient;
pub mod report;

pub use domain::{FitConfig, FitReport, PointSample, PointSampleSet, ReferenceBasis, Roi, TargetSpecification};
pub use engine::fit;
pub use error::FitError;
