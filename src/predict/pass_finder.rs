use chrono::{DateTime, Duration, Utc};

use crate::predict::{PassWindow, PredictError};
use crate::tle::ElementSet;
use crate::tracker::{GroundObserver, SatelliteModel, TrackerError};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const HORIZON_ELEVATION: f64 = 0.0;
const MAX_PASS_HOURS: i64 = 24;

/// Bounds on a pass search.
#[derive(Debug, Clone, Copy)]
pub struct PassSearch {
    /// No pass rising after `start + horizon` is reported.
    pub horizon: Duration,
    /// Gap between one pass's set and the search for the next rise.
    pub guard: Duration,
}

impl Default for PassSearch {
    fn default() -> Self {
        Self {
            horizon: Duration::days(7),
            guard: Duration::minutes(1),
        }
    }
}

/// Up to `count` passes whose rise is strictly after `start`.
///
/// Returns fewer windows when the horizon runs out or propagation fails part
/// way; a pass already in progress at `start` is skipped.
pub fn next_passes(
    elements: &ElementSet,
    observer: &GroundObserver,
    count: usize,
    start: DateTime<Utc>,
    search: &PassSearch,
) -> Result<Vec<PassWindow>, PredictError> {
    if search.horizon <= Duration::zero() {
        return Err(PredictError::InvalidHorizon);
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let model = SatelliteModel::new(elements)?;
    let deadline = start + search.horizon;
    let guard = search.guard.max(Duration::seconds(FINE_STEP_SECONDS));

    let mut passes: Vec<PassWindow> = Vec::with_capacity(count);
    let mut clock = start;

    while passes.len() < count {
        match find_next_pass(&model, observer, clock, deadline) {
            Ok(Some(window)) => {
                clock = window.set_time + guard;
                passes.push(window);
            }
            Ok(None) => {
                log::debug!(
                    "No further pass of {} before {} ({} found)",
                    model.name(),
                    deadline,
                    passes.len()
                );
                break;
            }
            Err(e) => {
                log::warn!("Pass search for {} stopped early: {}", model.name(), e);
                break;
            }
        }
    }

    Ok(passes)
}

fn elevation(
    model: &SatelliteModel,
    observer: &GroundObserver,
    at: DateTime<Utc>,
) -> Result<f64, TrackerError> {
    Ok(model.look_angles(observer, at)?.elevation_deg)
}

fn find_next_pass(
    model: &SatelliteModel,
    observer: &GroundObserver,
    after: DateTime<Utc>,
    deadline: DateTime<Utc>,
) -> Result<Option<PassWindow>, TrackerError> {
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);

    let mut prev = after;
    let mut prev_visible = elevation(model, observer, after)? >= HORIZON_ELEVATION;
    let mut rise: Option<DateTime<Utc>> = None;
    let mut max_el = HORIZON_ELEVATION;

    loop {
        let cursor = prev + coarse_step;
        match rise {
            None if cursor > deadline => return Ok(None),
            Some(rise_time) if cursor - rise_time > Duration::hours(MAX_PASS_HOURS) => {
                return Ok(None)
            }
            _ => {}
        }

        let el = elevation(model, observer, cursor)?;
        let visible = el >= HORIZON_ELEVATION;

        if visible && !prev_visible {
            // AOS - refine to find exact crossing
            rise = Some(refine_crossing(model, observer, prev, cursor, true)?);
            max_el = el;
        } else if visible && rise.is_some() {
            max_el = max_el.max(el);
        } else if !visible && prev_visible {
            if let Some(rise_time) = rise {
                let set_time = refine_crossing(model, observer, prev, cursor, false)?;
                return Ok(Some(PassWindow {
                    rise_time,
                    set_time,
                    max_elevation_deg: round2(max_el),
                }));
            }
        }

        prev = cursor;
        prev_visible = visible;
    }
}

/// Binary search over whole UTC seconds for the first second on the far side
/// of the horizon within `(before, after]`.
fn refine_crossing(
    model: &SatelliteModel,
    observer: &GroundObserver,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
) -> Result<DateTime<Utc>, TrackerError> {
    let mut low = before.timestamp();
    let mut high = after.timestamp();
    if after.timestamp_subsec_nanos() > 0 {
        high += 1;
    }

    while high - low > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = elevation(model, observer, whole_second(mid)?)? >= HORIZON_ELEVATION;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    whole_second(high)
}

fn whole_second(secs: i64) -> Result<DateTime<Utc>, TrackerError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TrackerError::Propagation(format!("timestamp {} out of range", secs)))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
