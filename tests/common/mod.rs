#![allow(dead_code)]

use nalgebra::{Rotation3, Vector3};
use valve_fit::data::{SyntheticShape, SyntheticSpec, generate_capture};
use valve_fit::domain::{PointSample, PointSampleSet, ReferenceBasis};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn imu_up() -> ReferenceBasis {
    ReferenceBasis::imu(Vector3::z())
}

/// 1,000 points on z = 0, σ = 1 mm, 10% outliers in a 1 m cube.
pub fn floor_capture(seed: u64) -> PointSampleSet {
    generate_capture(&SyntheticSpec::horizontal_plane(seed)).expect("synthetic floor")
}

/// 500 points on the Z axis, σ = 1 mm, 10% outliers in a 1 m cube.
pub fn vertical_axis_capture(seed: u64) -> PointSampleSet {
    generate_capture(&SyntheticSpec::vertical_line(seed)).expect("synthetic axis")
}

/// A plane through the origin whose normal leans `pitch_deg` about +Y.
pub fn pitched_plane_capture(pitch_deg: f64, seed: u64) -> PointSampleSet {
    let a = pitch_deg.to_radians();
    let mut spec = SyntheticSpec::horizontal_plane(seed);
    spec.shape = SyntheticShape::Plane {
        point: Vector3::zeros(),
        normal: Vector3::new(a.sin(), 0.0, a.cos()),
    };
    generate_capture(&spec).expect("synthetic pitched plane")
}

/// Apply `r` to every point; the result is unbounded.
pub fn rotated(set: &PointSampleSet, r: &Rotation3<f64>) -> PointSampleSet {
    PointSampleSet::unbounded(
        set.samples()
            .iter()
            .map(|s| PointSample {
                position: r * s.position,
                confidence: s.confidence,
            })
            .collect(),
    )
}
