use serde::{Deserialize, Serialize};

pub const RECORD_VERSION: u32 = 1;

/// One sample of what the HUD would display for a car.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub tick: u64,
    pub time_s: f32,
    pub speed_kmh: f32,
    pub boost: f32,
    pub position: [f32; 3],
    pub yaw: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierRecord {
    pub midpoint: [f32; 3],
    pub heading_yaw: f32,
    pub length: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRecord {
    pub position: [f32; 3],
    pub yaw: f32,
}

/// Everything a renderer/collider needs to assemble a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometryRecord {
    pub version: u32,
    pub name: String,
    pub track_width: f32,
    pub centerline: Vec<[f32; 3]>,
    pub left: Vec<[f32; 3]>,
    pub right: Vec<[f32; 3]>,
    pub left_barriers: Vec<BarrierRecord>,
    pub right_barriers: Vec<BarrierRecord>,
    pub start: StartRecord,
    pub road_indices: Vec<u32>,
}
