use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Sub-satellite point of the tracked object at an instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "altitude")]
    pub altitude_km: f64,
    /// Range rate relative to the observer, in km/h.
    #[serde(rename = "speed")]
    pub ground_speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

/// Topocentric view of the object from an observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
}
