//! Headless fixed-step drive session over a [`KinematicBody`].

use std::fmt;
use std::str::FromStr;

use race_records::TelemetryFrame;
use tracing::{debug, info};

use crate::body::KinematicBody;
use crate::dynamics::{DynamicsParams, TickSummary, VehicleController};
use crate::input::{Control, SharedInput, UnknownControl};
use crate::math;
use crate::telemetry::Telemetry;
use crate::track::TrackStart;

pub const DEFAULT_TICK_HZ: u32 = 60;

/// Controls held for a span of time.
#[derive(Clone, Debug, PartialEq)]
pub struct DrivePhase {
    pub controls: Vec<Control>,
    pub seconds: f32,
}

impl fmt::Display for DrivePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.controls.is_empty() {
            f.write_str("none")?;
        }
        for (i, control) in self.controls.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{control}")?;
        }
        write!(f, ":{}", self.seconds)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("drive script has no phases")]
    Empty,
    #[error("phase '{0}' is missing ':seconds'")]
    MissingDuration(String),
    #[error("phase '{phase}' has invalid duration '{value}'")]
    BadDuration { phase: String, value: String },
    #[error(transparent)]
    Control(#[from] UnknownControl),
}

/// Sequence of phases, written as `forward:3,forward+right:2,none:4`.
#[derive(Clone, Debug, PartialEq)]
pub struct DriveScript {
    pub phases: Vec<DrivePhase>,
}

impl DriveScript {
    pub fn total_seconds(&self) -> f32 {
        self.phases.iter().map(|p| p.seconds).sum()
    }
}

impl Default for DriveScript {
    fn default() -> Self {
        Self {
            phases: vec![
                DrivePhase {
                    controls: vec![Control::Forward],
                    seconds: 3.0,
                },
                DrivePhase {
                    controls: vec![Control::Forward, Control::Right],
                    seconds: 2.0,
                },
                DrivePhase {
                    controls: vec![Control::Forward, Control::Boost],
                    seconds: 2.0,
                },
                DrivePhase {
                    controls: vec![Control::Left, Control::Handbrake],
                    seconds: 1.0,
                },
                DrivePhase {
                    controls: Vec::new(),
                    seconds: 4.0,
                },
            ],
        }
    }
}

impl FromStr for DriveScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut phases = Vec::new();
        for raw in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (names, seconds) = raw
                .split_once(':')
                .ok_or_else(|| ScriptError::MissingDuration(raw.to_string()))?;

            let seconds = seconds
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|s| *s >= 0.0 && s.is_finite())
                .ok_or_else(|| ScriptError::BadDuration {
                    phase: raw.to_string(),
                    value: seconds.to_string(),
                })?;

            let controls = match names.trim() {
                "none" | "" => Vec::new(),
                names => names
                    .split('+')
                    .map(|name| name.trim().parse::<Control>())
                    .collect::<Result<Vec<_>, _>>()?,
            };
            phases.push(DrivePhase { controls, seconds });
        }

        if phases.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { phases })
    }
}

/// One car driven on a fixed timestep, fed from a [`SharedInput`].
pub struct DriveSession {
    controller: VehicleController,
    body: KinematicBody,
    telemetry: Telemetry,
    input: SharedInput,
    tick_hz: u32,
    tick: u64,
}

impl DriveSession {
    pub fn new(params: DynamicsParams, start: TrackStart, tick_hz: u32) -> Self {
        Self {
            controller: VehicleController::new(params),
            body: KinematicBody::at(start.position, math::quat_from_yaw(start.yaw)),
            telemetry: Telemetry::default(),
            input: SharedInput::new(),
            tick_hz: tick_hz.max(1),
            tick: 0,
        }
    }

    /// Handle for input sources; any clone may set or clear controls.
    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    pub fn body(&self) -> &KinematicBody {
        &self.body
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }

    /// Run one tick with whatever input is currently held.
    pub fn step(&mut self) -> TickSummary {
        let dt = self.dt();
        let snapshot = self.input.snapshot();
        let summary = self
            .controller
            .tick(dt, &snapshot, &mut self.body, &mut self.telemetry);
        self.body.integrate(summary.dt);
        self.tick += 1;
        summary
    }

    pub fn frame(&self) -> TelemetryFrame {
        self.telemetry.frame(self.tick, self.tick as f32 * self.dt())
    }

    /// Play every phase of `script`, reporting a frame every `every` ticks.
    pub fn run<F>(&mut self, script: &DriveScript, every: u64, mut on_frame: F) -> TelemetryFrame
    where
        F: FnMut(&TelemetryFrame),
    {
        let every = every.max(1);
        for phase in &script.phases {
            let ticks = (phase.seconds * self.tick_hz as f32).round() as u64;
            info!(phase = %phase, ticks, "drive phase");

            self.input.clear_all();
            for &control in &phase.controls {
                self.input.set(control);
            }

            for _ in 0..ticks {
                let summary = self.step();
                if self.tick % every == 0 {
                    on_frame(&self.frame());
                }
                debug!(
                    tick = self.tick,
                    forward_speed = summary.forward_speed,
                    steering = summary.steering_angle,
                    "tick"
                );
            }
        }
        self.input.clear_all();
        self.frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::Vec3;

    fn origin() -> TrackStart {
        TrackStart {
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }

    #[test]
    fn script_parses_phases() {
        let script: DriveScript = "forward:3, forward+right:1.5,none:2".parse().unwrap();
        assert_eq!(script.phases.len(), 3);
        assert_eq!(script.phases[1].controls, vec![Control::Forward, Control::Right]);
        assert_eq!(script.phases[1].seconds, 1.5);
        assert!(script.phases[2].controls.is_empty());
        assert_eq!(script.total_seconds(), 6.5);
    }

    #[test]
    fn script_rejects_bad_phases() {
        assert_eq!("".parse::<DriveScript>(), Err(ScriptError::Empty));
        assert_eq!(
            "forward".parse::<DriveScript>(),
            Err(ScriptError::MissingDuration("forward".to_string()))
        );
        assert!(matches!(
            "forward:-1".parse::<DriveScript>(),
            Err(ScriptError::BadDuration { .. })
        ));
        assert!(matches!(
            "fly:2".parse::<DriveScript>(),
            Err(ScriptError::Control(_))
        ));
    }

    #[test]
    fn phases_display_in_script_syntax() {
        let script: DriveScript = "forward+boost:2,none:1".parse().unwrap();
        let text: Vec<String> = script.phases.iter().map(|p| p.to_string()).collect();
        assert_eq!(text, vec!["forward+boost:2", "none:1"]);
    }

    #[test]
    fn session_reports_frames_at_the_requested_rate() {
        let script: DriveScript = "forward:1,none:1".parse().unwrap();
        let mut session = DriveSession::new(DynamicsParams::default(), origin(), 60);
        let mut frames = Vec::new();
        let last = session.run(&script, 10, |frame| frames.push(frame.clone()));

        assert_eq!(frames.len(), 12);
        assert_eq!(frames[0].tick, 10);
        assert_eq!(last.tick, 120);
        // Coasting after the throttle phase
        assert!(frames[11].speed_kmh < frames[5].speed_kmh);
        assert!(session.body().position.z > 0.0);
    }

    #[test]
    fn session_tick_reads_shared_input() {
        let mut session = DriveSession::new(DynamicsParams::default(), origin(), 60);
        let keyboard = session.input();
        keyboard.set(Control::Forward);
        session.step();
        assert!(session.telemetry().position == Vec3::ZERO);
        assert!(session.body().velocity.z > 0.0);

        keyboard.clear(Control::Forward);
        let summary = session.step();
        assert!(summary.impulse.z < 0.0);
    }

    #[test]
    fn session_spawns_at_track_start() {
        let start = TrackStart {
            position: Vec3::new(4.0, 0.0, -2.0),
            yaw: 1.0,
        };
        let session = DriveSession::new(DynamicsParams::default(), start, 0);
        assert_eq!(session.body().position, start.position);
        assert!((math::yaw_from_quat(session.body().rotation) - 1.0).abs() < 1e-5);
        assert_eq!(session.dt(), 1.0);
    }
}
