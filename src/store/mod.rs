//! Boundaries to the persistence and identity collaborators.
//!
//! The gateway never holds a database handle directly; it talks to these
//! traits so the Postgres implementations in `db` and the in-memory ones
//! used by tests are interchangeable.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::account::{Boat, User};
use crate::models::claim::Claim;
use crate::models::datapoint::Datapoint;
use crate::models::trip::Trip;

#[cfg(test)]
pub mod memory;

#[async_trait]
pub trait TripStore: Send + Sync {
    /// All trips of a boat, most recent `start_date` first.
    async fn find_trips_by_boat(&self, boat_id: i64) -> Result<Vec<Trip>>;

    async fn find_datapoints_by_trip(&self, trip_id: Uuid) -> Result<Vec<Datapoint>>;

    /// Inserts the trip or updates the stored record with the same id.
    async fn save_trip(&self, trip: &Trip) -> Result<()>;

    async fn save_datapoint(&self, datapoint: &Datapoint) -> Result<()>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// The boat with `emblem`, provided `user` is associated with it.
    async fn get_boat_for_user(&self, user: &User, emblem: &str) -> Result<Option<Boat>>;

    async fn get_boat_by_emblem(&self, emblem: &str) -> Result<Option<Boat>>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolves an opaque credential to the identity it was issued for.
    async fn verify(&self, token: &str) -> Result<Claim>;
}
