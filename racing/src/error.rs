use std::path::PathBuf;

/// Invalid input to one of the track geometry builders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackError {
    #[error("a closed track needs at least 4 control points, got {got}")]
    TooFewControlPoints { got: usize },
    #[error("sample count must be at least 1")]
    ZeroSamples,
    #[error("track width must be positive, got {0}")]
    NonPositiveWidth(f32),
    #[error("barrier spacing must be positive, got {0}")]
    NonPositiveSpacing(f32),
    #[error("barrier spacing {spacing} is too small for a {length} long loop")]
    SpacingTooSmall { spacing: f32, length: f32 },
    #[error("centerline needs at least {needed} samples, got {got}")]
    TooFewSamples { needed: usize, got: usize },
}

/// Failure to read, parse or write a track or tuning file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },
    #[error("failed to serialize track: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("track '{name}' is invalid: {source}")]
    Geometry { name: String, source: TrackError },
}
