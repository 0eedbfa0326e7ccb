use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::{IdentityVerifier, TripStore, UserDirectory};
use crate::models::account::{Boat, User};
use crate::models::claim::{Claim, Role};
use crate::models::datapoint::Datapoint;
use crate::models::trip::Trip;

#[derive(Debug, Default)]
pub struct MemoryTripStore {
    trips: Mutex<Vec<Trip>>,
    datapoints: Mutex<Vec<Datapoint>>,
    unavailable: AtomicBool,
}

impl MemoryTripStore {
    /// Makes every subsequent call fail, like a lost database connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn trips(&self) -> Vec<Trip> {
        self.trips.lock().unwrap().clone()
    }

    pub fn datapoints(&self) -> Vec<Datapoint> {
        self.datapoints.lock().unwrap().clone()
    }

    pub fn trip(&self, trip_id: Uuid) -> Option<Trip> {
        self.trips
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.trip_id == trip_id)
            .cloned()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("trip store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn find_trips_by_boat(&self, boat_id: i64) -> Result<Vec<Trip>> {
        self.check_available()?;
        let mut trips: Vec<Trip> = self
            .trips
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.boat_id == boat_id)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(trips)
    }

    async fn find_datapoints_by_trip(&self, trip_id: Uuid) -> Result<Vec<Datapoint>> {
        self.check_available()?;
        let mut datapoints: Vec<Datapoint> = self
            .datapoints
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.trip_id == trip_id)
            .cloned()
            .collect();
        datapoints.sort_by_key(|d| d.timestamp);
        Ok(datapoints)
    }

    async fn save_trip(&self, trip: &Trip) -> Result<()> {
        self.check_available()?;
        let mut trips = self.trips.lock().unwrap();
        match trips.iter_mut().find(|t| t.trip_id == trip.trip_id) {
            Some(existing) => *existing = trip.clone(),
            None => trips.push(trip.clone()),
        }
        Ok(())
    }

    async fn save_datapoint(&self, datapoint: &Datapoint) -> Result<()> {
        self.check_available()?;
        self.datapoints.lock().unwrap().push(datapoint.clone());
        Ok(())
    }
}

/// Users, boats, their associations and issued tokens.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: Vec<User>,
    boats: Vec<Boat>,
    links: Vec<(i64, i64)>,
    tokens: HashMap<String, Claim>,
}

impl MemoryDirectory {
    pub fn with_boat(mut self, boat_id: i64, emblem: &str) -> Self {
        self.boats.push(Boat {
            boat_id,
            emblem: emblem.to_string(),
        });
        self
    }

    pub fn with_user(mut self, user_id: i64, username: &str) -> Self {
        self.users.push(User {
            user_id,
            username: username.to_string(),
        });
        self
    }

    pub fn with_link(mut self, user_id: i64, boat_id: i64) -> Self {
        self.links.push((user_id, boat_id));
        self
    }

    pub fn with_token(mut self, token: &str, role: Role, identifier: &str) -> Self {
        self.tokens
            .insert(token.to_string(), Claim::new(role, identifier));
        self
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_boat_for_user(&self, user: &User, emblem: &str) -> Result<Option<Boat>> {
        Ok(self
            .boats
            .iter()
            .find(|b| b.emblem == emblem && self.links.contains(&(user.user_id, b.boat_id)))
            .cloned())
    }

    async fn get_boat_by_emblem(&self, emblem: &str) -> Result<Option<Boat>> {
        Ok(self.boats.iter().find(|b| b.emblem == emblem).cloned())
    }
}

#[async_trait]
impl IdentityVerifier for MemoryDirectory {
    async fn verify(&self, token: &str) -> Result<Claim> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow!("unknown token"))
    }
}
