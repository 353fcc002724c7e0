//! Yaw-only helpers on top of `bevy_math`.
//!
//! The track is planar in XZ with Y up. A yaw of zero faces +Z and positive
//! yaw rotates about +Y, so `forward(yaw)` is `(sin yaw, 0, cos yaw)`.

use bevy_math::{Quat, Vec3};

/// Extract the heading of an orientation, discarding pitch and roll.
pub fn yaw_from_quat(q: Quat) -> f32 {
    let siny = 2.0 * (q.w * q.y + q.x * q.z);
    let cosy = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    siny.atan2(cosy)
}

/// Pure heading rotation about the vertical axis.
pub fn quat_from_yaw(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

pub fn forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Lateral axis of the vehicle, `forward` rotated -90° about Y.
pub fn right(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Heading of a direction in the ground plane, inverse of [`forward`].
pub fn yaw_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Tangent rotated 90° in the ground plane, normalized. Zero for a zero tangent.
pub fn ground_normal(tangent: Vec3) -> Vec3 {
    Vec3::new(-tangent.z, 0.0, tangent.x).normalize_or_zero()
}

/// Length of the XZ component.
pub fn horizontal_length(v: Vec3) -> f32 {
    v.x.hypot(v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn yaw_survives_quat_round_trip() {
        for yaw in [-3.0, -1.2, 0.0, 0.4, 2.9] {
            assert!(close(yaw_from_quat(quat_from_yaw(yaw)), yaw));
        }
    }

    #[test]
    fn yaw_ignores_tilt() {
        let tilted = Quat::from_rotation_x(0.3) * quat_from_yaw(0.7);
        assert!(close(yaw_from_quat(tilted), 0.7));
    }

    #[test]
    fn basis_matches_quat_rotation() {
        let yaw = 1.1;
        let q = quat_from_yaw(yaw);
        assert!((q * Vec3::Z - forward(yaw)).length() < 1e-5);
        assert!((q * Vec3::X - right(yaw)).length() < 1e-5);
        assert!(close(forward(yaw).dot(right(yaw)), 0.0));
    }

    #[test]
    fn yaw_of_inverts_forward() {
        assert!(close(yaw_of(forward(-0.8)), -0.8));
        assert!(close(yaw_of(Vec3::X), FRAC_PI_2));
    }

    #[test]
    fn ground_normal_is_perpendicular_and_unit() {
        let t = Vec3::new(3.0, 0.0, 4.0);
        let n = ground_normal(t);
        assert!(close(n.length(), 1.0));
        assert!(close(n.dot(t), 0.0));
        assert_eq!(ground_normal(Vec3::ZERO), Vec3::ZERO);
    }
}
