use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// One visibility window above the observer's horizon.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassWindow {
    pub rise_time: DateTime<Utc>,
    pub set_time: DateTime<Utc>,
    pub max_elevation_deg: f64,
}

impl PassWindow {
    pub fn duration_seconds(&self) -> i64 {
        (self.set_time - self.rise_time).num_seconds()
    }
}
