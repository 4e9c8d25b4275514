//! Pitch and roll of a fitted direction relative to the up vector.
//!
//! The up vector is first rotated onto +Z; in that frame
//!
//! ```text
//! pitch = atan2(v.x, v.z)   (lean about the horizontal Y axis)
//! roll  = atan2(v.y, v.z)   (lean about the horizontal X axis)
//! ```
//!
//! so a direction parallel to up reads (0, 0).

use std::f64::consts::PI;

use nalgebra::{Rotation3, Vector3};

use crate::domain::{PrimitiveKind, round_to};
use crate::error::FitError;

/// Resolved orientation of a fitted primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Degrees, `[-180, 180]`, one decimal.
    pub pitch_deg: f64,
    /// Degrees, `[-180, 180]`, one decimal.
    pub roll_deg: f64,
    /// Unit direction after sign disambiguation (capture frame).
    pub direction: Vector3<f64>,
}

/// Rotation that carries unit `up` onto +Z.
///
/// Shortest arc in general; a half turn about +X when `up` points down.
pub fn level_rotation(up: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::rotation_between(up, &Vector3::z())
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), PI))
}

/// Pitch/roll of `direction` (unit) against `up` (unit).
///
/// The sign of a line axis or plane normal is arbitrary, so the direction is
/// flipped to agree with up first. That is impossible when it lies within
/// `epsilon` (`|v . u|`, roughly the sine of the tilt) of horizontal:
/// - a line is snapped onto the horizontal plane and its largest horizontal
///   component made positive; a minor component below `epsilon` is dropped
/// - a plane is reported as [`FitError::AmbiguousOrientation`]
pub fn resolve_angles(
    kind: PrimitiveKind,
    direction: &Vector3<f64>,
    up: &Vector3<f64>,
    epsilon: f64,
) -> Result<Orientation, FitError> {
    let level = level_rotation(up);
    let along_up = direction.dot(up);

    let (local, v) = if along_up.abs() < epsilon {
        match kind {
            PrimitiveKind::Plane => return Err(FitError::AmbiguousOrientation),
            PrimitiveKind::Line => {
                let h = horizontal_axis(level * direction, epsilon);
                (h, level.inverse() * h.normalize())
            }
        }
    } else {
        let v = if along_up < 0.0 { -direction } else { *direction };
        (level * v, v)
    };

    Ok(Orientation {
        pitch_deg: to_reported_degrees(local.x.atan2(local.z)),
        roll_deg: to_reported_degrees(local.y.atan2(local.z)),
        direction: v,
    })
}

/// Levelled axis with the noise-borne vertical sign removed.
///
/// Components are written as exact `+0.0` so `atan2` cannot pick up a stray
/// sign from them.
fn horizontal_axis(mut h: Vector3<f64>, epsilon: f64) -> Vector3<f64> {
    let (major, minor) = if h.x.abs() >= h.y.abs() { (0, 1) } else { (1, 0) };
    if h[major] < 0.0 {
        h = -h;
    }
    h.z = 0.0;
    if h[minor].abs() < epsilon {
        h[minor] = 0.0;
    }
    h
}

fn to_reported_degrees(radians: f64) -> f64 {
    round_to(radians.to_degrees().clamp(-180.0, 180.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitConfig;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-6;

    #[test]
    fn parallel_direction_is_level() {
        let o = resolve_angles(PrimitiveKind::Plane, &Vector3::z(), &Vector3::z(), EPS).unwrap();
        assert_eq!((o.pitch_deg, o.roll_deg), (0.0, 0.0));

        // Flipped normal is re-oriented, not reported as 180°.
        let o = resolve_angles(PrimitiveKind::Plane, &-Vector3::z(), &Vector3::z(), EPS).unwrap();
        assert_eq!((o.pitch_deg, o.roll_deg), (0.0, 0.0));
        assert_relative_eq!(o.direction, Vector3::z());
    }

    #[test]
    fn tilt_about_y_is_pitch() {
        let angle = 10f64.to_radians();
        let v = Vector3::new(angle.sin(), 0.0, angle.cos());
        let o = resolve_angles(PrimitiveKind::Line, &v, &Vector3::z(), EPS).unwrap();
        assert_eq!(o.pitch_deg, 10.0);
        assert_eq!(o.roll_deg, 0.0);
    }

    #[test]
    fn tilt_about_x_is_roll() {
        let angle = 5f64.to_radians();
        let v = Vector3::new(0.0, -angle.sin(), angle.cos());
        let o = resolve_angles(PrimitiveKind::Plane, &v, &Vector3::z(), EPS).unwrap();
        assert_eq!(o.pitch_deg, 0.0);
        assert_eq!(o.roll_deg, -5.0);
    }

    #[test]
    fn tilted_up_is_levelled_first() {
        // Same relative geometry as `tilt_about_y_is_pitch`, viewed from a sensor
        // rolled 30° about X.
        let r = Rotation3::from_axis_angle(&Vector3::x_axis(), 30f64.to_radians());
        let angle = 10f64.to_radians();
        let v = r * Vector3::new(angle.sin(), 0.0, angle.cos());
        let up = r * Vector3::z();
        let o = resolve_angles(PrimitiveKind::Line, &v, &up, EPS).unwrap();
        assert_eq!(o.pitch_deg, 10.0);
        assert_eq!(o.roll_deg, 0.0);
    }

    #[test]
    fn downward_up_uses_half_turn() {
        let rot = level_rotation(&-Vector3::z());
        assert_relative_eq!(rot * -Vector3::z(), Vector3::z(), epsilon = 1e-12);

        let o = resolve_angles(PrimitiveKind::Plane, &-Vector3::z(), &-Vector3::z(), EPS).unwrap();
        assert_eq!((o.pitch_deg, o.roll_deg), (0.0, 0.0));
    }

    #[test]
    fn horizontal_plane_normal_is_ambiguous() {
        let err = resolve_angles(PrimitiveKind::Plane, &Vector3::x(), &Vector3::z(), EPS).unwrap_err();
        assert_eq!(err, FitError::AmbiguousOrientation);
    }

    #[test]
    fn horizontal_line_gets_a_stable_sign() {
        let a = resolve_angles(PrimitiveKind::Line, &Vector3::x(), &Vector3::z(), EPS).unwrap();
        let b = resolve_angles(PrimitiveKind::Line, &-Vector3::x(), &Vector3::z(), EPS).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pitch_deg, 90.0);
        assert_relative_eq!(a.direction, Vector3::x());
    }

    #[test]
    fn near_horizontal_line_ignores_the_vertical_sign() {
        let eps = FitConfig::default().orientation_epsilon;
        let up_tilt = Vector3::new(1.0, 2e-4, 3e-4).normalize();
        let down_tilt = Vector3::new(-1.0, -1e-4, 3e-4).normalize();

        let a = resolve_angles(PrimitiveKind::Line, &up_tilt, &Vector3::z(), eps).unwrap();
        let b = resolve_angles(PrimitiveKind::Line, &down_tilt, &Vector3::z(), eps).unwrap();
        assert_eq!((a.pitch_deg, a.roll_deg), (90.0, 0.0));
        assert_eq!((b.pitch_deg, b.roll_deg), (90.0, 0.0));
        assert_relative_eq!(a.direction, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(b.direction, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn diagonal_horizontal_line_keeps_both_components() {
        let eps = FitConfig::default().orientation_epsilon;
        let v = Vector3::new(-1.0, -1.0, 1e-3).normalize();
        let o = resolve_angles(PrimitiveKind::Line, &v, &Vector3::z(), eps).unwrap();
        assert_eq!((o.pitch_deg, o.roll_deg), (90.0, 90.0));
    }

    #[test]
    fn plane_within_a_degree_of_vertical_is_ambiguous() {
        let eps = FitConfig::default().orientation_epsilon;
        let normal = Vector3::new(1.0, 0.0, 0.5f64.to_radians().tan()).normalize();
        let err = resolve_angles(PrimitiveKind::Plane, &normal, &Vector3::z(), eps).unwrap_err();
        assert_eq!(err, FitError::AmbiguousOrientation);

        let normal = Vector3::new(1.0, 0.0, 2f64.to_radians().tan()).normalize();
        let o = resolve_angles(PrimitiveKind::Plane, &normal, &Vector3::z(), eps).unwrap();
        assert_eq!(o.pitch_deg, 88.0);
    }

    #[test]
    fn angles_stay_in_range_with_one_decimal() {
        for i in 0..50 {
            let t = i as f64 * 0.37;
            let v = Vector3::new(t.cos(), t.sin(), 0.3 + (t * 1.7).sin()).normalize();
            if let Ok(o) = resolve_angles(PrimitiveKind::Line, &v, &Vector3::z(), EPS) {
                for a in [o.pitch_deg, o.roll_deg] {
                    assert!((-180.0..=180.0).contains(&a));
                    assert_relative_eq!(a * 10.0, (a * 10.0).round(), epsilon = 1e-9);
                }
            }
        }
    }
}
