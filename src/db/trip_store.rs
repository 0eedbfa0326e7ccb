use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::{queries, DbPool};
use crate::models::datapoint::Datapoint;
use crate::models::trip::Trip;
use crate::store::TripStore;

pub struct PgTripStore {
    pool: DbPool,
}

impl PgTripStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for PgTripStore {
    async fn find_trips_by_boat(&self, boat_id: i64) -> Result<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(queries::SELECT_TRIPS_BY_BOAT)
            .bind(boat_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(trips)
    }

    async fn find_datapoints_by_trip(&self, trip_id: Uuid) -> Result<Vec<Datapoint>> {
        let datapoints = sqlx::query_as::<_, Datapoint>(queries::SELECT_DATAPOINTS_BY_TRIP)
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(datapoints)
    }

    async fn save_trip(&self, trip: &Trip) -> Result<()> {
        sqlx::query(queries::UPSERT_TRIP)
            .bind(trip.trip_id)
            .bind(trip.boat_id)
            .bind(&trip.name)
            .bind(trip.start_date)
            .bind(trip.end_date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_datapoint(&self, datapoint: &Datapoint) -> Result<()> {
        sqlx::query(queries::INSERT_DATAPOINT)
            .bind(datapoint.datapoint_id)
            .bind(datapoint.trip_id)
            .bind(datapoint.timestamp)
            .bind(&datapoint.data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
