//! Poll loop orchestration.

use cc2mqtt_core::{
    diff, distance_km, next_delay, seed_previous, CadenceState, Coordinate, FetchError,
    Publisher, QoS, SnapshotFetcher, VehicleSnapshot, VehicleTopics,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// Messages handed to the publisher
    pub published: usize,
    /// Distance from home, if the ignition was on and a position known
    pub distance_km: Option<f64>,
    /// Delay before the next poll
    pub delay: Duration,
}

/// Fetch, diff, publish, sleep. Repeat.
pub struct PollLoop<F, P> {
    fetcher: F,
    publisher: P,
    home: Coordinate,
    previous: Option<VehicleSnapshot>,
    cadence: CadenceState<Instant>,
    last_distance: Option<f64>,
}

impl<F, P> PollLoop<F, P>
where
    F: SnapshotFetcher,
    P: Publisher,
{
    /// Create a poll loop. Cadence tracking starts now.
    pub fn new(fetcher: F, publisher: P, home: Coordinate) -> Self {
        Self {
            fetcher,
            publisher,
            home,
            previous: None,
            cadence: CadenceState::new(Instant::now()),
            last_distance: None,
        }
    }

    /// Delay chosen by the last successful iteration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.cadence.delay
    }

    /// Run one iteration without sleeping.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if no snapshot could be obtained. The
    /// retained snapshot and cadence state are left untouched in that case.
    pub async fn step(&mut self) -> Result<IterationReport, FetchError> {
        let current = self.fetcher.fetch_full().await?;
        let topics = VehicleTopics::new(current.license_plate.clone());

        let previous = self.previous.take().unwrap_or_else(|| {
            tracing::info!(
                license_plate = %current.license_plate,
                "First snapshot, forcing a full publish"
            );
            seed_previous(&current)
        });

        let changes = diff(&previous, &current).without_timestamps();
        if changes.is_empty() {
            tracing::debug!("No change");
        }

        let mut published = 0;
        for change in changes {
            let topic = topics.field(change.path);
            tracing::info!(path = change.path, topic, "Change detected, publishing");
            if self.send(&topic, &change.value.to_payload()) {
                published += 1;
            }
        }

        let now = Instant::now();
        let mut distance = None;

        if current.ignition.on {
            self.cadence.last_ignition_on = now;

            if let Some(position) = &current.position {
                let km = distance_km(self.home, position.coordinate());
                distance = Some(km);

                if self.last_distance != Some(km) && self.send(&topics.distance(), &km.to_string())
                {
                    published += 1;
                    self.last_distance = Some(km);
                }
            } else {
                tracing::warn!("Ignition on but no position reported, skipping distance");
            }
        }

        let since_ignition_on = now.duration_since(self.cadence.last_ignition_on);
        let delay = next_delay(current.ignition.on, distance, since_ignition_on);
        self.cadence.delay = delay;

        tracing::debug!(
            ignition_on = current.ignition.on,
            distance_km = ?distance,
            since_ignition_on_secs = since_ignition_on.as_secs(),
            delay_secs = delay.as_secs(),
            "Next poll scheduled"
        );

        self.previous = Some(current);

        Ok(IterationReport {
            published,
            distance_km: distance,
            delay,
        })
    }

    /// Poll until `shutdown` completes.
    ///
    /// Shutdown is only observed while sleeping between iterations, so an
    /// iteration in progress always finishes. Fetch failures are logged and
    /// retried after the previous delay.
    pub async fn run_until<S>(mut self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let delay = match self.step().await {
                Ok(report) => report.delay,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        retry_secs = self.delay().as_secs(),
                        "Failed to fetch vehicle data"
                    );
                    self.delay()
                }
            };

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Publish a retained message, logging failures.
    fn send(&self, topic: &str, payload: &str) -> bool {
        match self.publisher.publish(topic, payload, QoS::AtMostOnce, true) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, topic, "Failed to publish");
                false
            }
        }
    }
}
