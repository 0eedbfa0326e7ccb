use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Label format for trip names, e.g. `09:05 3.7.2024`.
pub const TRIP_NAME_FORMAT: &str = "%H:%M %-d.%-m.%Y";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Trip {
    pub trip_id: Uuid,
    pub boat_id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>, // NULL while the trip is open
}

impl Trip {
    /// A fresh, open trip starting at `now`.
    pub fn open(boat_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            trip_id: Uuid::new_v4(),
            boat_id,
            name: now.format(TRIP_NAME_FORMAT).to_string(),
            start_date: now,
            end_date: None,
        }
    }
}
