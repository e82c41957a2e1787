mod error;
mod ground_station;
mod position;
mod trajectory;
mod types;

pub use error::TrackerError;
pub use ground_station::{GroundObserver, EARTH_ROTATION_RAD_S};
pub use position::{position_at, SatelliteModel};
pub use trajectory::{trajectory, MAX_TRAJECTORY_SAMPLES};
pub use types::{LookAngles, Position};
