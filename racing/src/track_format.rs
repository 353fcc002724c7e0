use bevy_math::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FileError;
use crate::track::DEFAULT_SAMPLE_COUNT;

const BUILTIN_TRACK: &str = include_str!("../assets/tracks/harbour.toml");

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackFile {
    #[serde(default)]
    pub metadata: TrackMetadata,
    /// Ground-plane control points as `[x, z]`.
    pub control_points: Vec<[f32; 2]>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_track_width")]
    pub track_width: f32,
    #[serde(default = "default_barrier_spacing")]
    pub barrier_spacing: f32,
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: String::new(),
            track_width: default_track_width(),
            barrier_spacing: default_barrier_spacing(),
            sample_count: default_sample_count(),
        }
    }
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_track_width() -> f32 {
    12.0
}

fn default_barrier_spacing() -> f32 {
    4.0
}

fn default_sample_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

impl TrackFile {
    /// Create a new empty track with default metadata.
    pub fn new_empty(name: &str) -> Self {
        Self {
            metadata: TrackMetadata {
                name: name.to_string(),
                ..TrackMetadata::default()
            },
            control_points: Vec::new(),
        }
    }

    /// The track shipped with the crate.
    pub fn load_builtin() -> Result<Self, FileError> {
        Self::parse(BUILTIN_TRACK, "builtin track")
    }

    /// Load a track from a TOML file.
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, origin: &str) -> Result<Self, FileError> {
        toml::from_str(text).map_err(|source| FileError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Save this track to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Control points lifted onto the ground plane (y = 0).
    pub fn control_points_vec3(&self) -> Vec<Vec3> {
        self.control_points
            .iter()
            .map(|&[x, z]| Vec3::new(x, 0.0, z))
            .collect()
    }
}
