//! Shared domain types.
//!
//! These types are the vocabulary of the engine boundary:
//!
//! - inputs: `PointSample`, `Roi`, `PointSampleSet`, `TargetSpecification`,
//!   `ReferenceBasis`, `FitConfig`
//! - intermediate: `FittedPrimitive`
//! - output: `FitReport` (and its persisted-precision view `StoredMeasurement`)

use clap::ValueEnum;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::models::Primitive;

/// Norm below which a direction vector is treated as zero.
pub const NORM_EPS: f64 = 1e-6;

/// A single captured 3D point (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub position: Vector3<f64>,
    /// Optional sensor confidence in `[0, 1]`.
    pub confidence: Option<f64>,
}

impl PointSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Weight used by the least-squares refinement (1.0 when untagged).
    pub fn weight(&self) -> f64 {
        self.confidence.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.confidence.is_none_or(|c| c.is_finite())
    }
}

/// Region of interest: a box of `width × height × depth` (along local X/Y/Z)
/// around `center`, optionally rotated into the capture frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    pub center: Vector3<f64>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    /// Box orientation (local → capture frame). `None` means axis-aligned.
    pub rotation: Option<Rotation3<f64>>,
}

impl Roi {
    pub fn axis_aligned(center: Vector3<f64>, width: f64, height: f64, depth: f64) -> Self {
        Self {
            center,
            width,
            height,
            depth,
            rotation: None,
        }
    }

    pub fn oriented(
        center: Vector3<f64>,
        width: f64,
        height: f64,
        depth: f64,
        rotation: Rotation3<f64>,
    ) -> Self {
        Self {
            center,
            width,
            height,
            depth,
            rotation: Some(rotation),
        }
    }

    /// A box that contains every finite point.
    pub fn unbounded() -> Self {
        Self::axis_aligned(Vector3::zeros(), f64::INFINITY, f64::INFINITY, f64::INFINITY)
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        let offset = p - self.center;
        let local = match &self.rotation {
            Some(r) => r.inverse_transform_vector(&offset),
            None => offset,
        };
        local.x.abs() <= self.width / 2.0
            && local.y.abs() <= self.height / 2.0
            && local.z.abs() <= self.depth / 2.0
    }
}

/// Caller-owned capture: raw samples plus the ROI they are bounded by.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSampleSet {
    samples: Vec<PointSample>,
    roi: Roi,
}

impl PointSampleSet {
    pub fn new(samples: Vec<PointSample>, roi: Roi) -> Self {
        Self { samples, roi }
    }

    pub fn unbounded(samples: Vec<PointSample>) -> Self {
        Self::new(samples, Roi::unbounded())
    }

    pub fn samples(&self) -> &[PointSample] {
        &self.samples
    }

    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Geometric primitive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Line,
    Plane,
}

impl PrimitiveKind {
    /// Points needed for a closed-form minimal fit.
    pub fn minimal_sample_size(self) -> usize {
        match self {
            PrimitiveKind::Line => 2,
            PrimitiveKind::Plane => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PrimitiveKind::Line => "line",
            PrimitiveKind::Plane => "plane",
        }
    }
}

/// What the operator aimed the sensor at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum TargetSpecification {
    /// Valve stem axis.
    #[serde(rename = "A")]
    #[value(name = "A", alias = "a")]
    StemAxis,
    /// Handle plane.
    #[serde(rename = "B")]
    #[value(name = "B", alias = "b")]
    HandlePlane,
    /// Flange face.
    #[serde(rename = "C")]
    #[value(name = "C", alias = "c")]
    FlangeFace,
    /// Pipe / conduit axis.
    #[serde(rename = "D")]
    #[value(name = "D", alias = "d")]
    PipeAxis,
}

impl TargetSpecification {
    pub const ALL: [TargetSpecification; 4] = [
        TargetSpecification::StemAxis,
        TargetSpecification::HandlePlane,
        TargetSpecification::FlangeFace,
        TargetSpecification::PipeAxis,
    ];

    pub fn primitive(self) -> PrimitiveKind {
        match self {
            TargetSpecification::StemAxis | TargetSpecification::PipeAxis => PrimitiveKind::Line,
            TargetSpecification::HandlePlane | TargetSpecification::FlangeFace => PrimitiveKind::Plane,
        }
    }

    /// Single-letter code used by the surrounding system's records.
    pub fn code(self) -> char {
        match self {
            TargetSpecification::StemAxis => 'A',
            TargetSpecification::HandlePlane => 'B',
            TargetSpecification::FlangeFace => 'C',
            TargetSpecification::PipeAxis => 'D',
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TargetSpecification::StemAxis => "stem axis",
            TargetSpecification::HandlePlane => "handle plane",
            TargetSpecification::FlangeFace => "flange face",
            TargetSpecification::PipeAxis => "pipe axis",
        }
    }
}

/// Source of the "up" reference direction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceBasis {
    /// Up vector taken directly from an inertial reading.
    Imu { up: Vector3<f64> },
    /// Up vector from a plane fitted to an auxiliary ground capture; the normal
    /// is flipped to agree with `up_hint`.
    Plane {
        ground: PointSampleSet,
        up_hint: Vector3<f64>,
    },
}

impl ReferenceBasis {
    pub fn imu(up: Vector3<f64>) -> Self {
        ReferenceBasis::Imu { up }
    }

    /// Inertial units report gravity pointing down; up is its negation.
    pub fn from_gravity(gravity: Vector3<f64>) -> Self {
        ReferenceBasis::Imu { up: -gravity }
    }

    pub fn ground_plane(ground: PointSampleSet, up_hint: Vector3<f64>) -> Self {
        ReferenceBasis::Plane { ground, up_hint }
    }

    pub fn kind(&self) -> BasisKind {
        match self {
            ReferenceBasis::Imu { .. } => BasisKind::Imu,
            ReferenceBasis::Plane { .. } => BasisKind::Plane,
        }
    }
}

/// Tag of a [`ReferenceBasis`] (for reports and the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BasisKind {
    Imu,
    Plane,
}

impl BasisKind {
    pub fn display_name(self) -> &'static str {
        match self {
            BasisKind::Imu => "imu",
            BasisKind::Plane => "plane",
        }
    }
}

/// k-nearest-neighbour statistical outlier pre-filter.
///
/// A point is dropped when its mean distance to its `neighbors` nearest
/// neighbours exceeds `mean + std_ratio * std` of that statistic over the set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFilter {
    pub neighbors: usize,
    pub std_ratio: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            neighbors: 20,
            std_ratio: 2.0,
        }
    }
}

/// Engine configuration.
///
/// Every threshold the engine uses lives here; nothing is hidden in constants
/// the caller cannot see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// RANSAC inlier distance `τ` (meters).
    pub inlier_threshold_m: f64,
    /// Minimum inlier ratio for `is_valid`.
    pub min_inlier_ratio: f64,
    /// Maximum residual RMS (meters) for `is_valid`.
    pub max_residual_rms_m: f64,
    /// Hard cap on RANSAC iterations.
    pub max_ransac_iterations: usize,
    /// Probability `p` that at least one draw is outlier-free.
    pub target_confidence: f64,
    pub min_point_count: usize,
    /// Larger captures are decimated (seeded) down to this count.
    pub max_point_count: usize,

    /// Inlier fraction prior `w` used to size the iteration budget.
    pub assumed_inlier_fraction: f64,
    /// Consensus floor as a fraction of the point count.
    pub min_consensus_ratio: f64,
    /// Principal standard deviation (meters) below which a spread is degenerate.
    pub degenerate_spread_m: f64,
    /// `τ` used when fitting the ground plane of a `plane` basis.
    pub ground_inlier_threshold_m: f64,
    /// `|v · up|` below which a direction counts as horizontal. Roughly the
    /// sine of the tilt, so the default treats anything within 1° of level as
    /// sign-ambiguous; fitted directions are never closer than their noise.
    pub orientation_epsilon: f64,
    /// Samples with a confidence below this are ignored.
    pub min_confidence: f64,
    /// Optional statistical outlier pre-filter.
    pub outlier_filter: Option<OutlierFilter>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            inlier_threshold_m: 0.005,
            min_inlier_ratio: 0.6,
            max_residual_rms_m: 0.01,
            max_ransac_iterations: 1000,
            target_confidence: 0.99,
            min_point_count: 100,
            max_point_count: 10_000,
            assumed_inlier_fraction: 0.5,
            min_consensus_ratio: 0.1,
            degenerate_spread_m: 0.002,
            ground_inlier_threshold_m: 0.02,
            orientation_epsilon: 1f64.to_radians().sin(),
            min_confidence: 0.0,
            outlier_filter: None,
        }
    }
}

impl FitConfig {
    /// Reject non-finite or out-of-range settings.
    pub fn validate(&self) -> Result<(), FitError> {
        fn positive(name: &str, v: f64) -> Result<(), FitError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(FitError::InvalidConfig(format!("{name} must be finite and > 0 (got {v})")))
            }
        }
        fn unit_open(name: &str, v: f64) -> Result<(), FitError> {
            if v.is_finite() && v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(FitError::InvalidConfig(format!("{name} must lie in (0, 1) (got {v})")))
            }
        }
        fn fraction(name: &str, v: f64) -> Result<(), FitError> {
            if v.is_finite() && v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(FitError::InvalidConfig(format!("{name} must lie in (0, 1] (got {v})")))
            }
        }
        fn unit_closed(name: &str, v: f64) -> Result<(), FitError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(FitError::InvalidConfig(format!("{name} must lie in [0, 1] (got {v})")))
            }
        }

        positive("inlier_threshold_m", self.inlier_threshold_m)?;
        positive("max_residual_rms_m", self.max_residual_rms_m)?;
        positive("degenerate_spread_m", self.degenerate_spread_m)?;
        positive("ground_inlier_threshold_m", self.ground_inlier_threshold_m)?;
        unit_open("orientation_epsilon", self.orientation_epsilon)?;
        unit_open("target_confidence", self.target_confidence)?;
        fraction("assumed_inlier_fraction", self.assumed_inlier_fraction)?;
        unit_closed("min_inlier_ratio", self.min_inlier_ratio)?;
        unit_closed("min_consensus_ratio", self.min_consensus_ratio)?;
        unit_closed("min_confidence", self.min_confidence)?;

        if self.max_ransac_iterations == 0 {
            return Err(FitError::InvalidConfig("max_ransac_iterations must be >= 1".to_string()));
        }
        // A plane needs three points; anything smaller cannot seed RANSAC.
        if self.min_point_count < PrimitiveKind::Plane.minimal_sample_size() {
            return Err(FitError::InvalidConfig(format!(
                "min_point_count must be >= {}",
                PrimitiveKind::Plane.minimal_sample_size()
            )));
        }
        if self.max_point_count < self.min_point_count {
            return Err(FitError::InvalidConfig(format!(
                "max_point_count ({}) < min_point_count ({})",
                self.max_point_count, self.min_point_count
            )));
        }
        if let Some(filter) = &self.outlier_filter {
            if filter.neighbors == 0 {
                return Err(FitError::InvalidConfig("outlier_filter.neighbors must be >= 1".to_string()));
            }
            positive("outlier_filter.std_ratio", filter.std_ratio)?;
        }
        Ok(())
    }
}

/// A primitive together with its consensus set.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPrimitive {
    pub primitive: Primitive,
    /// Indices into the canonical point set the fit ran on.
    pub inliers: Vec<usize>,
    /// Perpendicular distance of each inlier, in `inliers` order.
    pub residuals: Vec<f64>,
    /// RANSAC hypotheses that were scored.
    pub iterations: usize,
}

impl FittedPrimitive {
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }
}

/// The engine's only output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub target: TargetSpecification,
    pub primitive: PrimitiveKind,
    pub basis: BasisKind,

    /// Degrees, `[-180, 180]`, one decimal.
    pub pitch_deg: f64,
    /// Degrees, `[-180, 180]`, one decimal.
    pub roll_deg: f64,

    /// Points the fit ran on (after ROI filtering and decimation).
    pub point_count: usize,
    pub inlier_count: usize,
    pub inlier_ratio: f64,
    /// Meters.
    pub residual_rms: f64,
    pub quality_score: f64,
    pub is_valid: bool,

    /// Line axis or plane normal, oriented towards `up`.
    pub direction: [f64; 3],
    pub up: [f64; 3],
    /// Point on the refined primitive (weighted inlier centroid).
    pub anchor: [f64; 3],
    /// Points inside the ROI before decimation.
    pub roi_point_count: usize,
    pub iterations: usize,
    pub seed: u64,
}

/// Persisted-precision view of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMeasurement {
    pub target_type: char,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    pub basis: BasisKind,
    pub point_count: usize,
    pub inlier_ratio: f64,
    pub residual_rms: f64,
    pub quality_score: f64,
}

impl FitReport {
    /// Angles at one decimal, ratios and score at three.
    pub fn stored(&self) -> StoredMeasurement {
        StoredMeasurement {
            target_type: self.target.code(),
            pitch_deg: round_to(self.pitch_deg, 1),
            roll_deg: round_to(self.roll_deg, 1),
            basis: self.basis,
            point_count: self.point_count,
            inlier_ratio: round_to(self.inlier_ratio, 3),
            residual_rms: self.residual_rms,
            quality_score: round_to(self.quality_score, 3),
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn targets_bind_primitives() {
        assert_eq!(TargetSpecification::StemAxis.primitive(), PrimitiveKind::Line);
        assert_eq!(TargetSpecification::HandlePlane.primitive(), PrimitiveKind::Plane);
        assert_eq!(TargetSpecification::FlangeFace.primitive(), PrimitiveKind::Plane);
        assert_eq!(TargetSpecification::PipeAxis.primitive(), PrimitiveKind::Line);
        let codes: String = TargetSpecification::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, "ABCD");
    }

    #[test]
    fn target_serializes_as_letter() {
        let json = serde_json::to_string(&TargetSpecification::FlangeFace).unwrap();
        assert_eq!(json, "\"C\"");
        let back: TargetSpecification = serde_json::from_str("\"D\"").unwrap();
        assert_eq!(back, TargetSpecification::PipeAxis);
    }

    #[test]
    fn roi_is_boundary_inclusive() {
        let roi = Roi::axis_aligned(Vector3::new(1.0, 0.0, 0.0), 2.0, 1.0, 1.0);
        assert!(roi.contains(&Vector3::new(2.0, 0.5, -0.5)));
        assert!(!roi.contains(&Vector3::new(2.01, 0.0, 0.0)));
        assert!(Roi::unbounded().contains(&Vector3::new(1e9, -1e9, 3.0)));
    }

    #[test]
    fn oriented_roi_uses_local_axes() {
        // A long thin box rotated 45° about Z.
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
        let roi = Roi::oriented(Vector3::zeros(), 2.0, 0.1, 0.1, rot);
        let along = Vector3::new(0.6, 0.6, 0.0);
        let across = Vector3::new(0.6, -0.6, 0.0);
        assert!(roi.contains(&along));
        assert!(!roi.contains(&across));
    }

    #[test]
    fn gravity_is_negated_into_up() {
        let basis = ReferenceBasis::from_gravity(Vector3::new(0.0, 0.0, -9.81));
        match basis {
            ReferenceBasis::Imu { up } => assert!(up.z > 0.0),
            ReferenceBasis::Plane { .. } => panic!("expected imu basis"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        FitConfig::default().validate().unwrap();
    }

    #[test]
    fn config_rejects_bad_values() {
        let mut config = FitConfig::default();
        config.target_confidence = 1.0;
        assert!(matches!(config.validate(), Err(FitError::InvalidConfig(_))));

        let mut config = FitConfig::default();
        config.max_point_count = 50;
        assert!(matches!(config.validate(), Err(FitError::InvalidConfig(_))));

        let mut config = FitConfig::default();
        config.inlier_threshold_m = f64::NAN;
        assert!(matches!(config.validate(), Err(FitError::InvalidConfig(_))));

        let mut config = FitConfig::default();
        config.orientation_epsilon = 1.0;
        assert!(matches!(config.validate(), Err(FitError::InvalidConfig(_))));
    }

    #[test]
    fn full_inlier_fraction_is_accepted_everywhere() {
        let config = FitConfig {
            assumed_inlier_fraction: 1.0,
            ..FitConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(crate::fit::ransac_iterations(PrimitiveKind::Plane, &config).unwrap(), 1);

        let config = FitConfig {
            assumed_inlier_fraction: 0.0,
            ..FitConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(crate::fit::ransac_iterations(PrimitiveKind::Plane, &config).is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: FitConfig = serde_json::from_str(r#"{ "inlier_threshold_m": 0.01 }"#).unwrap();
        assert_eq!(config.inlier_threshold_m, 0.01);
        assert_eq!(config.min_point_count, 100);
        assert!(config.outlier_filter.is_none());
    }

    #[test]
    fn stored_view_rounds() {
        let report = FitReport {
            target: TargetSpecification::HandlePlane,
            primitive: PrimitiveKind::Plane,
            basis: BasisKind::Imu,
            pitch_deg: 1.25,
            roll_deg: -0.04,
            point_count: 1000,
            inlier_count: 901,
            inlier_ratio: 0.9012,
            residual_rms: 0.0012,
            quality_score: 0.71234,
            is_valid: true,
            direction: [0.0, 0.0, 1.0],
            up: [0.0, 0.0, 1.0],
            anchor: [0.0; 3],
            roi_point_count: 1000,
            iterations: 35,
            seed: 7,
        };
        let stored = report.stored();
        assert_eq!(stored.target_type, 'B');
        assert_eq!(stored.inlier_ratio, 0.901);
        assert_eq!(stored.quality_score, 0.712);
        assert_eq!(stored.roll_deg, -0.0);
    }
}
