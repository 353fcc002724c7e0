use std::path::Path;

use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::body::RigidBodyHandle;
use crate::error::FileError;
use crate::input::InputSnapshot;
use crate::math;
use crate::telemetry::{MAX_BOOST, TelemetrySink};

/// Longest step a single tick may integrate. Larger frame gaps (tab switch,
/// debugger break) would otherwise produce one huge impulse.
pub const MAX_TICK_DT: f32 = 0.05;
/// Fraction of the steering error left after one second.
const STEERING_LAG: f32 = 0.001;
const STEERING_EPSILON: f32 = 0.01;
const MOVING_SPEED: f32 = 0.1;
const KMH_PER_MPS: f32 = 3.6;

/// Tunables of the arcade handling model. Units are metres, seconds, radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    pub max_speed: f32,
    pub acceleration: f32,
    pub braking: f32,
    /// Forward speed above which "back" brakes instead of reversing.
    pub brake_threshold: f32,
    pub reverse_acceleration: f32,
    pub max_reverse_speed: f32,
    /// Exponential drag rate while coasting, per second.
    pub coast_decay: f32,
    pub boost_factor: f32,
    pub boost_drain_rate: f32,
    pub boost_regen_rate: f32,
    pub max_steering_angle: f32,
    pub steering_gain: f32,
    /// Turn-rate multiplier at standstill.
    pub min_turn_factor: f32,
    /// Speed at which the full turn rate is reached.
    pub full_turn_speed: f32,
    /// Turn-rate multiplier at and above `max_speed`.
    pub high_speed_turn_floor: f32,
    pub grip: f32,
    pub handbrake_grip: f32,
    pub lateral_threshold: f32,
    /// Velocity kept per tick while the handbrake is held.
    pub handbrake_damping: f32,
    /// Slerp factor per tick towards an upright orientation.
    pub upright_blend: f32,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            max_speed: 45.0,
            acceleration: 18.0,
            braking: 40.0,
            brake_threshold: 0.5,
            reverse_acceleration: 9.0,
            max_reverse_speed: 12.0,
            coast_decay: 0.8,
            boost_factor: 1.5,
            boost_drain_rate: 25.0,
            boost_regen_rate: 5.0,
            max_steering_angle: 0.5,
            steering_gain: 3.0,
            min_turn_factor: 0.3,
            full_turn_speed: 8.0,
            high_speed_turn_floor: 0.45,
            grip: 8.0,
            handbrake_grip: 1.5,
            lateral_threshold: 0.05,
            handbrake_damping: 0.985,
            upright_blend: 0.1,
        }
    }
}

impl DynamicsParams {
    /// Load tuning overrides from a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| FileError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }
}

/// Turn-rate multiplier for the current speed: ramps up from
/// `min_turn_factor` at rest, full rate at `full_turn_speed`, then tapers
/// towards `high_speed_turn_floor` at `max_speed`.
pub fn turn_factor(speed: f32, params: &DynamicsParams) -> f32 {
    if speed < params.full_turn_speed {
        let ramp = (speed / params.full_turn_speed).clamp(0.0, 1.0);
        params.min_turn_factor + (1.0 - params.min_turn_factor) * ramp
    } else {
        let span = (params.max_speed - params.full_turn_speed).max(f32::EPSILON);
        let taper = ((speed - params.full_turn_speed) / span).clamp(0.0, 1.0);
        (1.0 - (1.0 - params.high_speed_turn_floor) * taper).max(params.high_speed_turn_floor)
    }
}

/// What one tick computed, for logging and inspection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickSummary {
    pub dt: f32,
    pub forward_speed: f32,
    pub lateral_speed: f32,
    pub steering_angle: f32,
    pub angular_velocity: f32,
    pub boosting: bool,
    pub impulse: Vec3,
}

/// Per-car arcade handling. Holds the smoothed steering angle between ticks.
#[derive(Clone, Debug, Default)]
pub struct VehicleController {
    pub params: DynamicsParams,
    steering_angle: f32,
}

impl VehicleController {
    pub fn new(params: DynamicsParams) -> Self {
        Self {
            params,
            steering_angle: 0.0,
        }
    }

    pub fn steering_angle(&self) -> f32 {
        self.steering_angle
    }

    /// Advance the car by one simulation step.
    ///
    /// Reads the body once, applies at most one combined impulse and writes
    /// the rotation once. Must only be called while the race is running.
    ///
    /// # Panics
    ///
    /// If `frame_dt` is not a positive finite number.
    pub fn tick<B, T>(
        &mut self,
        frame_dt: f32,
        input: &InputSnapshot,
        body: &mut B,
        telemetry: &mut T,
    ) -> TickSummary
    where
        B: RigidBodyHandle + ?Sized,
        T: TelemetrySink + ?Sized,
    {
        assert!(
            frame_dt > 0.0 && frame_dt.is_finite(),
            "vehicle tick needs a positive dt, got {frame_dt}"
        );
        let dt = frame_dt.min(MAX_TICK_DT);
        let params = self.params;

        let velocity = body.linear_velocity();
        let yaw = math::yaw_from_quat(body.rotation());
        let forward = math::forward(yaw);
        let right = math::right(yaw);

        let forward_speed = velocity.dot(forward);
        let lateral_speed = velocity.dot(right);
        let speed = math::horizontal_length(velocity);

        let target_steering = match (input.left, input.right) {
            (false, true) => params.max_steering_angle,
            (true, false) => -params.max_steering_angle,
            _ => 0.0,
        };
        let blend = 1.0 - STEERING_LAG.powf(dt);
        self.steering_angle += (target_steering - self.steering_angle) * blend;

        let mass = body.mass();
        let mut impulse = Vec3::ZERO;
        let mut boost = telemetry.boost_amount();
        let boosting = input.forward && input.boost && boost > 0.0;

        if input.forward {
            let factor = if boosting { params.boost_factor } else { 1.0 };
            let limit = params.max_speed * factor;
            if forward_speed < limit {
                let gain = (params.acceleration * dt).min(limit - forward_speed);
                impulse += forward * gain * mass;
            }
            if boosting {
                boost = (boost - params.boost_drain_rate * dt).max(0.0);
            }
        } else if input.back {
            if forward_speed > params.brake_threshold {
                // Braking stops at zero, reversing needs another tick
                let loss = (params.braking * dt).min(forward_speed);
                impulse -= forward * loss * mass;
            } else if forward_speed > -params.max_reverse_speed {
                let headroom = forward_speed + params.max_reverse_speed;
                let gain = (params.reverse_acceleration * dt).min(headroom);
                impulse -= forward * gain * mass;
            }
        } else {
            let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
            let retained = (-params.coast_decay * dt).exp();
            impulse -= horizontal * (1.0 - retained) * mass;
        }

        let turning = self.steering_angle.abs() > STEERING_EPSILON
            && (speed > MOVING_SPEED || input.forward || input.back);
        let angular_velocity = if turning {
            let direction = if forward_speed < 0.0 { -1.0 } else { 1.0 };
            -self.steering_angle * params.steering_gain * turn_factor(speed, &params) * direction
        } else {
            0.0
        };
        body.set_angular_velocity(Vec3::new(0.0, angular_velocity, 0.0));

        if lateral_speed.abs() > params.lateral_threshold {
            let grip = if input.handbrake {
                params.handbrake_grip
            } else {
                params.grip
            };
            let correction = (grip * dt).min(1.0);
            impulse -= right * lateral_speed * correction * mass;
        }

        if input.handbrake {
            impulse -= velocity * (1.0 - params.handbrake_damping) * mass;
        }

        if impulse != Vec3::ZERO {
            body.apply_impulse(impulse);
        }

        let upright = math::quat_from_yaw(yaw);
        let corrected = body.rotation().slerp(upright, params.upright_blend).normalize();
        body.set_rotation(corrected);

        if !boosting {
            boost += params.boost_regen_rate * dt;
        }
        telemetry.set_boost_amount(boost.clamp(0.0, MAX_BOOST));
        telemetry.set_speed(forward_speed.abs() * KMH_PER_MPS);
        telemetry.set_position(body.translation());
        telemetry.set_yaw(math::yaw_from_quat(corrected));

        trace!(
            dt,
            forward_speed,
            lateral_speed,
            steering = self.steering_angle,
            angular_velocity,
            boosting,
            "vehicle tick"
        );

        TickSummary {
            dt,
            forward_speed,
            lateral_speed,
            steering_angle: self.steering_angle,
            angular_velocity,
            boosting,
            impulse,
        }
    }
}
