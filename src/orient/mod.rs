//! Orientation: where "up" is, and how the fitted direction leans against it.
//!
//! - `reference`: resolve the up unit vector from an IMU reading or a ground capture
//! - `angles`: pitch/roll of a fitted direction relative to up

pub mod angles;
pub mod reference;

pub use angles::*;
pub use reference::*;
