//! Polling cadence.
//!
//! The delay between fetches depends on what the vehicle is doing. Parked
//! for a while means slow polling. While driving, the delay shrinks as the
//! vehicle gets closer to home, so arrival and departure are caught with
//! fine resolution while long trips cost few requests.
//!
//! The distance bands assume a worst-case speed of about 90 km/h: a band's
//! delay keeps the distance travelled between two polls well inside the band.

use std::time::Duration;

/// Delay while parked outside the grace window.
pub const IDLE_DELAY: Duration = Duration::from_secs(300);

/// Delay inside the grace window after the ignition was last seen on.
pub const GRACE_DELAY: Duration = Duration::from_secs(30);

/// How long polling stays frequent after the ignition was last seen on.
pub const GRACE_WINDOW: Duration = Duration::from_secs(600);

/// Distance bands for a running vehicle, farthest first.
///
/// A vehicle more than `.0` km from home polls every `.1`.
const DISTANCE_BANDS: [(f64, Duration); 3] = [
    (30.0, Duration::from_secs(300)),
    (10.0, Duration::from_secs(120)),
    (2.0, Duration::from_secs(30)),
];

/// Delay within the innermost band.
pub const NEAR_HOME_DELAY: Duration = Duration::from_secs(10);

/// Compute the delay before the next fetch.
///
/// Thresholds are strict: a vehicle exactly on a band edge gets the shorter
/// delay of the band inside it, and exactly [`GRACE_WINDOW`] after the
/// ignition was last on the grace window has closed.
///
/// A running vehicle without a known distance is polled at the grace rate.
#[must_use]
pub fn next_delay(
    ignition_on: bool,
    distance_km: Option<f64>,
    since_ignition_on: Duration,
) -> Duration {
    if !ignition_on {
        return if since_ignition_on < GRACE_WINDOW {
            GRACE_DELAY
        } else {
            IDLE_DELAY
        };
    }

    let Some(distance) = distance_km else {
        return GRACE_DELAY;
    };

    DISTANCE_BANDS
        .iter()
        .find(|(threshold, _)| distance > *threshold)
        .map_or(NEAR_HOME_DELAY, |(_, delay)| *delay)
}

/// Mutable cadence bookkeeping owned by the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct CadenceState<I> {
    /// When the ignition was last observed on
    pub last_ignition_on: I,
    /// Delay chosen by the last successful iteration
    pub delay: Duration,
}

impl<I> CadenceState<I> {
    /// Start tracking at `now`.
    ///
    /// Counting the loop start as "ignition last seen on" keeps polling
    /// frequent for the first grace window after startup.
    pub fn new(now: I) -> Self {
        Self {
            last_ignition_on: now,
            delay: IDLE_DELAY,
        }
    }
}
