//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - capture inputs (`PointSample`, `Roi`, `PointSampleSet`)
//! - request enums (`TargetSpecification`, `ReferenceBasis`) and `FitConfig`
//! - fit outputs (`FittedPrimitive`, `FitReport`)

pub mod types;

pub use types::*;
