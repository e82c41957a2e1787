use chrono::{DateTime, Duration, Utc};

use crate::tracker::{GroundObserver, Position, SatelliteModel, TrackerError};

pub const MAX_TRAJECTORY_SAMPLES: i64 = 10_000;

/// Sub-points from `start` through `start + duration` inclusive, every `interval`.
pub fn trajectory(
    model: &SatelliteModel,
    observer: &GroundObserver,
    start: DateTime<Utc>,
    duration: Duration,
    interval: Duration,
) -> Result<Vec<Position>, TrackerError> {
    if interval <= Duration::zero() {
        return Err(TrackerError::InvalidInterval);
    }
    if duration < Duration::zero() {
        return Err(TrackerError::InvalidDuration);
    }

    let samples = duration.num_milliseconds() / interval.num_milliseconds().max(1) + 1;
    if samples > MAX_TRAJECTORY_SAMPLES {
        return Err(TrackerError::TooManySamples(samples, MAX_TRAJECTORY_SAMPLES));
    }

    let end = start + duration;
    let mut cursor = start;
    let mut points = Vec::with_capacity(samples as usize);

    while cursor <= end {
        points.push(model.position_at(cursor, observer)?);
        cursor += interval;
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tle::ElementSet;
    use chrono::TimeZone;

    fn setup() -> (SatelliteModel, GroundObserver, DateTime<Utc>) {
        (
            SatelliteModel::new(&ElementSet::fallback()).unwrap(),
            GroundObserver::new(40.7128, -74.0060, 10.0).unwrap(),
            Utc.with_ymd_and_hms(2024, 8, 29, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn samples_inclusive_of_end() {
        let (model, observer, start) = setup();
        let points =
            trajectory(&model, &observer, start, Duration::hours(1), Duration::seconds(60)).unwrap();
        assert_eq!(points.len(), 61);
        assert_eq!(points[0].timestamp, start);
        assert_eq!(points[60].timestamp, start + Duration::hours(1));
    }

    #[test]
    fn zero_duration_is_single_point() {
        let (model, observer, start) = setup();
        let points =
            trajectory(&model, &observer, start, Duration::zero(), Duration::seconds(60)).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn rejects_bad_interval_and_duration() {
        let (model, observer, start) = setup();
        assert!(matches!(
            trajectory(&model, &observer, start, Duration::hours(1), Duration::zero()),
            Err(TrackerError::InvalidInterval)
        ));
        assert!(matches!(
            trajectory(&model, &observer, start, Duration::seconds(-5), Duration::seconds(1)),
            Err(TrackerError::InvalidDuration)
        ));
        assert!(matches!(
            trajectory(&model, &observer, start, Duration::days(30), Duration::seconds(1)),
            Err(TrackerError::TooManySamples(_, _))
        ));
    }
}
