pub mod barriers;
pub mod body;
pub mod dynamics;
pub mod error;
pub mod input;
pub mod math;
pub mod sim;
pub mod telemetry;
pub mod track;
pub mod track_format;

pub use body::RigidBodyHandle;
pub use dynamics::{DynamicsParams, VehicleController};
pub use error::{FileError, TrackError};
pub use input::{Control, InputSnapshot, SharedInput};
pub use telemetry::TelemetrySink;
