//! Primitive fitting.
//!
//! Responsibilities:
//!
//! - size the RANSAC iteration budget (`budget`)
//! - draw minimal samples and score candidates in parallel (`ransac`)
//! - total-least-squares refinement and the final consensus pass (`refine`)
//! - tie the steps together with convergence guardrails (`fitter`)

pub mod budget;
pub mod fitter;
pub mod ransac;
pub mod refine;

pub use budget::*;
pub use fitter::*;
pub use ransac::*;
pub use refine::*;
