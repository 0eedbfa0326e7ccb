use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Datapoint {
    pub datapoint_id: Uuid,
    pub trip_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub data: String, // opaque telemetry payload
}

/// Telemetry sample that has not been assigned to a trip yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub data: String,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, data: impl Into<String>) -> Self {
        Self {
            timestamp,
            data: data.into(),
        }
    }

    pub fn into_datapoint(self, trip_id: Uuid) -> Datapoint {
        Datapoint {
            datapoint_id: Uuid::new_v4(),
            trip_id,
            timestamp: self.timestamp,
            data: self.data,
        }
    }
}
