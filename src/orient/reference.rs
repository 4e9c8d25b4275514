//! Reference frame resolution.

use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::prepare_samples;
use crate::domain::{FitConfig, NORM_EPS, PointSampleSet, PrimitiveKind, ReferenceBasis};
use crate::error::FitError;
use crate::fit::{FitOptions, fit_primitive};

/// Mixed into the call seed so the ground fit draws from its own stream.
const GROUND_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Unit "up" vector for `basis`.
///
/// There is no fallback between bases: a `plane` basis whose ground fit fails
/// returns that failure.
pub fn resolve_up(basis: &ReferenceBasis, config: &FitConfig, seed: u64) -> Result<Vector3<f64>, FitError> {
    match basis {
        ReferenceBasis::Imu { up } => unit(up, "imu up vector"),
        ReferenceBasis::Plane { ground, up_hint } => ground_normal(ground, up_hint, config, seed),
    }
}

fn unit(v: &Vector3<f64>, what: &str) -> Result<Vector3<f64>, FitError> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(FitError::InvalidReference(format!("{what} is not finite")));
    }
    v.try_normalize(NORM_EPS)
        .ok_or_else(|| FitError::InvalidReference(format!("{what} has norm < {NORM_EPS:e}")))
}

fn ground_normal(
    ground: &PointSampleSet,
    up_hint: &Vector3<f64>,
    config: &FitConfig,
    seed: u64,
) -> Result<Vector3<f64>, FitError> {
    let hint = unit(up_hint, "up hint")?;

    let mut rng = StdRng::seed_from_u64(seed ^ GROUND_STREAM);
    let prepared = prepare_samples(ground, PrimitiveKind::Plane, config, &mut rng)?;
    let opts = FitOptions::for_ground(config)?;
    let fitted = fit_primitive(&prepared, PrimitiveKind::Plane, &opts, &mut rng)?;

    let normal = fitted.primitive.principal_direction();
    let d = normal.dot(&hint);
    if d.abs() < config.orientation_epsilon {
        return Err(FitError::InvalidReference(
            "ground normal is perpendicular to the up hint".to_string(),
        ));
    }
    Ok(if d < 0.0 { -normal } else { normal })
}
