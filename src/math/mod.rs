//! Mathematical utilities: weighted moments and a 3×3 symmetric eigensolver.

pub mod eigen;
pub mod moments;

pub use eigen::*;
pub use moments::*;
