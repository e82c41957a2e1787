use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::tle::ElementSet;
use crate::tracker::ground_station::ecef_to_geodetic;
use crate::tracker::{GroundObserver, LookAngles, Position, TrackerError, EARTH_ROTATION_RAD_S};

/// SGP4 model built from one element set, reusable across many instants.
pub struct SatelliteModel {
    name: String,
    elements: Elements,
    constants: Constants,
}

struct EcefState {
    position: [f64; 3],
    velocity: [f64; 3],
}

impl SatelliteModel {
    pub fn new(set: &ElementSet) -> Result<Self, TrackerError> {
        let elements = Elements::from_tle(
            Some(set.name.clone()),
            set.line1.as_bytes(),
            set.line2.as_bytes(),
        )?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            name: set.name.clone(),
            elements,
            constants,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    fn propagate(&self, timestamp: DateTime<Utc>) -> Result<EcefState, TrackerError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| TrackerError::Propagation(e.to_string()))?;

        let prediction = self.constants.propagate(minutes)?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));

        Ok(EcefState {
            position: teme_to_ecef_position(prediction.position, sidereal),
            velocity: teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal),
        })
    }

    pub fn look_angles(
        &self,
        observer: &GroundObserver,
        timestamp: DateTime<Utc>,
    ) -> Result<LookAngles, TrackerError> {
        let state = self.propagate(timestamp)?;
        Ok(look_angles_from(&state, observer))
    }

    pub fn position_at(
        &self,
        timestamp: DateTime<Utc>,
        observer: &GroundObserver,
    ) -> Result<Position, TrackerError> {
        let state = self.propagate(timestamp)?;
        let (latitude, longitude, altitude_km) = ecef_to_geodetic(state.position);
        let look = look_angles_from(&state, observer);

        Ok(Position {
            latitude,
            longitude,
            altitude_km: round2(altitude_km),
            ground_speed_kmh: round2(look.range_rate_km_s.abs() * 3600.0),
            timestamp,
        })
    }
}

/// Position of `elements` at `timestamp`, with speed measured against `observer`.
pub fn position_at(
    elements: &ElementSet,
    timestamp: DateTime<Utc>,
    observer: &GroundObserver,
) -> Result<Position, TrackerError> {
    SatelliteModel::new(elements)?.position_at(timestamp, observer)
}

fn look_angles_from(state: &EcefState, observer: &GroundObserver) -> LookAngles {
    let sta_ecef = observer.position_ecef_km();
    let sta_vel = observer.velocity_ecef_km_s();

    let dr = [
        state.position[0] - sta_ecef[0],
        state.position[1] - sta_ecef[1],
        state.position[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    let enu = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
    let elevation = if range_km > 0.0 {
        (enu.2 / range_km).asin().to_degrees()
    } else {
        0.0
    };

    let los_unit = if range_km > 0.0 {
        [dr[0] / range_km, dr[1] / range_km, dr[2] / range_km]
    } else {
        [0.0, 0.0, 0.0]
    };
    let rel_vel = [
        state.velocity[0] - sta_vel[0],
        state.velocity[1] - sta_vel[1],
        state.velocity[2] - sta_vel[2],
    ];
    let range_rate_km_s =
        rel_vel[0] * los_unit[0] + rel_vel[1] * los_unit[1] + rel_vel[2] * los_unit[2];

    LookAngles {
        azimuth_deg: azimuth,
        elevation_deg: elevation,
        range_km,
        range_rate_km_s,
    }
}

fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
