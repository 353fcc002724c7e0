use bevy_math::{Quat, Vec3};

/// The capabilities the vehicle controller needs from a physics body.
///
/// Implemented over whatever physics engine owns the car between ticks.
pub trait RigidBodyHandle {
    fn linear_velocity(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn set_rotation(&mut self, rotation: Quat);
    fn apply_impulse(&mut self, impulse: Vec3);
    fn set_angular_velocity(&mut self, angular_velocity: Vec3);
    fn translation(&self) -> Vec3;
    fn mass(&self) -> f32;
}

/// Collision-free body that integrates velocity directly.
///
/// Used by the headless drive session and in tests.
#[derive(Clone, Debug)]
pub struct KinematicBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub rotation: Quat,
    pub mass: f32,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mass: 1.0,
        }
    }
}

impl KinematicBody {
    pub fn at(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Advance position and orientation by `dt`.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        let spin = self.angular_velocity * dt;
        if spin.length_squared() > 0.0 {
            self.rotation = (Quat::from_scaled_axis(spin) * self.rotation).normalize();
        }
    }
}

impl RigidBodyHandle for KinematicBody {
    fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
    }

    fn translation(&self) -> Vec3 {
        self.position
    }

    fn mass(&self) -> f32 {
        self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math;

    #[test]
    fn impulse_changes_velocity_by_inverse_mass() {
        let mut body = KinematicBody {
            mass: 4.0,
            ..KinematicBody::default()
        };
        body.apply_impulse(Vec3::new(8.0, 0.0, 0.0));
        assert_eq!(body.linear_velocity(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn integrate_moves_and_turns() {
        let mut body = KinematicBody::default();
        body.velocity = Vec3::new(0.0, 0.0, 10.0);
        body.angular_velocity = Vec3::new(0.0, 0.5, 0.0);
        body.integrate(0.5);
        assert_eq!(body.translation(), Vec3::new(0.0, 0.0, 5.0));
        assert!((math::yaw_from_quat(body.rotation()) - 0.25).abs() < 1e-5);
    }
}
