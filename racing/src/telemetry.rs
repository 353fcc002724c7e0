use bevy_math::Vec3;
use race_records::TelemetryFrame;

pub const MAX_BOOST: f32 = 100.0;

/// Where the controller publishes what the HUD shows.
pub trait TelemetrySink {
    fn boost_amount(&self) -> f32;
    fn set_boost_amount(&mut self, amount: f32);
    fn set_speed(&mut self, speed_kmh: f32);
    fn set_position(&mut self, position: Vec3);
    fn set_yaw(&mut self, yaw: f32);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    pub speed_kmh: f32,
    pub boost: f32,
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            speed_kmh: 0.0,
            boost: MAX_BOOST,
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

impl Telemetry {
    pub fn frame(&self, tick: u64, time_s: f32) -> TelemetryFrame {
        TelemetryFrame {
            tick,
            time_s,
            speed_kmh: self.speed_kmh,
            boost: self.boost,
            position: self.position.to_array(),
            yaw: self.yaw,
        }
    }
}

impl TelemetrySink for Telemetry {
    fn boost_amount(&self) -> f32 {
        self.boost
    }

    fn set_boost_amount(&mut self, amount: f32) {
        self.boost = amount;
    }

    fn set_speed(&mut self, speed_kmh: f32) {
        self.speed_kmh = speed_kmh;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }
}
