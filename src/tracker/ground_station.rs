use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tracker::TrackerError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

// WGS-84
pub(crate) const EARTH_RADIUS_KM: f64 = 6378.137;
pub(crate) const EARTH_E2: f64 = 0.00669437999014;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroundObserver {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

impl GroundObserver {
    pub fn new(latitude_deg: f64, longitude_deg: f64, elevation_m: f64) -> Result<Self, TrackerError> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(TrackerError::InvalidObserver(format!(
                "latitude {} outside [-90, 90]",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(TrackerError::InvalidObserver(format!(
                "longitude {} outside [-180, 180]",
                longitude_deg
            )));
        }
        if !elevation_m.is_finite() {
            return Err(TrackerError::InvalidObserver("elevation is not finite".into()));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            elevation_m,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = EARTH_RADIUS_KM / (1.0 - EARTH_E2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.elevation_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - EARTH_E2) + alt_km) * sin_lat,
        ]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

/// Geodetic latitude/longitude (degrees) and height (km) of an ECEF point.
pub(crate) fn ecef_to_geodetic(ecef: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = ecef;
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - EARTH_E2));
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = EARTH_RADIUS_KM / (1.0 - EARTH_E2 * sin_lat * sin_lat).sqrt();
        let next = (z + EARTH_E2 * n * sin_lat).atan2(p);
        let converged = (next - lat).abs() < 1e-12;
        lat = next;
        if converged {
            break;
        }
    }

    let sin_lat = lat.sin();
    let n = EARTH_RADIUS_KM / (1.0 - EARTH_E2 * sin_lat * sin_lat).sqrt();
    let height = p * lat.cos() + z * sin_lat - n * (1.0 - EARTH_E2 * sin_lat * sin_lat);

    (lat.to_degrees(), lon.to_degrees(), height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GroundObserver::new(91.0, 0.0, 0.0).is_err());
        assert!(GroundObserver::new(0.0, -180.5, 0.0).is_err());
        assert!(GroundObserver::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(GroundObserver::new(48.86, 2.35, 35.0).is_ok());
    }

    #[test]
    fn geodetic_roundtrip_of_observer() {
        let observer = GroundObserver::new(48.864716, 2.349014, 120.0).unwrap();
        let (lat, lon, height_km) = ecef_to_geodetic(observer.position_ecef_km());
        assert!((lat - observer.latitude_deg).abs() < 1e-6);
        assert!((lon - observer.longitude_deg).abs() < 1e-6);
        assert!((height_km - 0.120).abs() < 1e-6);
    }

    #[test]
    fn poles_have_full_latitude() {
        let north = GroundObserver::new(90.0, 0.0, 0.0).unwrap();
        let (lat, _, height_km) = ecef_to_geodetic(north.position_ecef_km());
        assert!((lat - 90.0).abs() < 1e-6);
        assert!(height_km.abs() < 1e-6);
    }
}
