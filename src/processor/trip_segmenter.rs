use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::datapoint::{Datapoint, Sample};
use crate::models::trip::Trip;
use crate::store::TripStore;

/// Minutes of telemetry silence after which live ingestion starts a new trip.
pub const DEFAULT_TIMEOUT_MINUTES: i64 = 20;

/// Groups incoming telemetry of a boat into trips by time continuity.
///
/// Resolution is read-then-write without cross-request locking: two samples
/// for the same boat racing through `resolve_or_create_trip` may both see no
/// usable trip and create one each.
pub struct TripSegmenter {
    store: Arc<dyn TripStore>,
}

impl TripSegmenter {
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self { store }
    }

    /// Attaches `sample` to the boat's current trip and persists it.
    pub async fn record_sample(
        &self,
        boat_id: i64,
        sample: Sample,
        timeout_minutes: i64,
    ) -> Result<Datapoint> {
        let trip = self.resolve_or_create_trip(boat_id, timeout_minutes).await?;

        let datapoint = sample.into_datapoint(trip.trip_id);
        self.store.save_datapoint(&datapoint).await?;
        debug!(
            "Saved datapoint {} to trip {} for boat {}",
            datapoint.datapoint_id, trip.trip_id, boat_id
        );

        Ok(datapoint)
    }

    pub async fn resolve_or_create_trip(&self, boat_id: i64, timeout_minutes: i64) -> Result<Trip> {
        self.resolve_or_create_trip_at(boat_id, timeout_minutes, Utc::now())
            .await
    }

    /// Returns the latest trip if its telemetry is still continuous at `now`,
    /// otherwise closes it and opens a new one.
    pub async fn resolve_or_create_trip_at(
        &self,
        boat_id: i64,
        timeout_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Trip> {
        let trips = self.store.find_trips_by_boat(boat_id).await?;

        if let Some(mut latest_trip) = trips.into_iter().next() {
            let datapoints = self.store.find_datapoints_by_trip(latest_trip.trip_id).await?;

            // An empty trip is always reused.
            let Some(latest_stamp) = datapoints.iter().map(|d| d.timestamp.timestamp()).max()
            else {
                return Ok(latest_trip);
            };

            // Whole seconds only; silence of exactly `timeout_minutes` continues the trip.
            let cutoff = now
                .timestamp()
                .saturating_sub(timeout_minutes.saturating_mul(60));
            if latest_stamp >= cutoff {
                return Ok(latest_trip);
            }

            latest_trip.end_date = DateTime::from_timestamp(latest_stamp, 0);
            self.store.save_trip(&latest_trip).await?;
            info!(
                "Closed trip {} for boat {} after {}s of silence",
                latest_trip.trip_id,
                boat_id,
                now.timestamp() - latest_stamp
            );
        }

        let trip = Trip::open(boat_id, now);
        self.store.save_trip(&trip).await?;
        info!("Started new trip {} ({}) for boat {}", trip.trip_id, trip.name, boat_id);

        Ok(trip)
    }
}
