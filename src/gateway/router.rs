use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::events::{EventKind, Frame};
use super::rooms::{room_for, ConnectionId, RoomRef, RoomRegistry};
use crate::models::claim::Role;
use crate::models::datapoint::Sample;
use crate::processor::trip_segmenter::TripSegmenter;
use crate::store::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no boatEmblem in room found")]
pub struct RoutingMiss;

/// What happened to an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Forwarded { room: String, delivered: usize },
    WrongDirection,
    UnknownEvent,
    Unroutable,
}

/// Side allowed to send each event kind.
fn allowed_sender(kind: EventKind) -> Role {
    match kind {
        EventKind::Command | EventKind::Setup => Role::Observer,
        EventKind::Data => Role::Boat,
    }
}

fn opposite(role: Role) -> Role {
    match role {
        Role::Boat => Role::Observer,
        Role::Observer => Role::Boat,
    }
}

/// Persists boat telemetry through the trip segmenter.
pub struct TelemetrySink {
    segmenter: Arc<TripSegmenter>,
    directory: Arc<dyn UserDirectory>,
    timeout_minutes: i64,
}

impl TelemetrySink {
    pub fn new(
        segmenter: Arc<TripSegmenter>,
        directory: Arc<dyn UserDirectory>,
        timeout_minutes: i64,
    ) -> Self {
        Self {
            segmenter,
            directory,
            timeout_minutes,
        }
    }

    pub async fn persist(&self, boat_emblem: &str, sample: Sample) -> Result<()> {
        let Some(boat) = self.directory.get_boat_by_emblem(boat_emblem).await? else {
            warn!("Telemetry for unknown boat '{}' not saved", boat_emblem);
            return Ok(());
        };

        self.segmenter
            .record_sample(boat.boat_id, sample, self.timeout_minutes)
            .await?;
        Ok(())
    }
}

/// Relays named events between a boat room and its observer room.
pub struct EventRouter {
    rooms: Arc<RoomRegistry>,
    telemetry: Option<Arc<TelemetrySink>>,
}

impl EventRouter {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self {
            rooms,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, sink: Arc<TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn resolve_room(&self, connection_id: ConnectionId) -> Result<RoomRef, RoutingMiss> {
        self.rooms
            .rooms_of(connection_id)
            .iter()
            .find_map(|room| RoomRef::parse(room))
            .ok_or(RoutingMiss)
    }

    /// Best effort: events that cannot or may not be forwarded are dropped.
    /// Must run inside a tokio runtime when telemetry persistence is enabled.
    pub fn route(&self, connection_id: ConnectionId, frame: Frame) -> RouteOutcome {
        let Some(kind) = EventKind::parse(&frame.event) else {
            debug!("Ignoring unknown event '{}' from {}", frame.event, connection_id);
            return RouteOutcome::UnknownEvent;
        };

        let origin = match self.resolve_room(connection_id) {
            Ok(origin) => origin,
            Err(e) => {
                warn!("Dropping '{}' from {}: {}", kind.as_str(), connection_id, e);
                return RouteOutcome::Unroutable;
            }
        };

        if origin.role != allowed_sender(kind) {
            debug!(
                "Dropping '{}' sent by {} side of {}",
                kind.as_str(),
                origin.role,
                origin.boat_emblem
            );
            return RouteOutcome::WrongDirection;
        }

        if kind == EventKind::Data {
            self.persist_telemetry(&origin.boat_emblem, &frame.data);
        }

        let room = room_for(opposite(origin.role), &origin.boat_emblem);
        let delivered = self.rooms.broadcast(&room, frame);
        RouteOutcome::Forwarded { room, delivered }
    }

    fn persist_telemetry(&self, boat_emblem: &str, payload: &str) {
        let Some(sink) = self.telemetry.clone() else {
            return;
        };
        if payload.is_empty() {
            return;
        }

        let boat_emblem = boat_emblem.to_string();
        let sample = Sample::new(Utc::now(), payload);
        // Saving must not hold up delivery to observers
        tokio::spawn(async move {
            if let Err(e) = sink.persist(&boat_emblem, sample).await {
                error!("Error saving telemetry for {}: {}", boat_emblem, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::rooms::ConnectionHandle;
    use crate::store::memory::{MemoryDirectory, MemoryTripStore};
    use crate::store::TripStore;
    use chrono::TimeZone;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        router: EventRouter,
        boat: ConnectionHandle,
        boat_rx: mpsc::Receiver<Frame>,
        observer: ConnectionHandle,
        observer_rx: mpsc::Receiver<Frame>,
    }

    fn connection() -> (ConnectionHandle, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(tx), rx)
    }

    fn fixture() -> Fixture {
        let rooms = Arc::new(RoomRegistry::default());
        let (boat, boat_rx) = connection();
        let (observer, observer_rx) = connection();
        rooms.join("ALPHA-boat", &boat);
        rooms.join("ALPHA-user", &observer);
        Fixture {
            router: EventRouter::new(rooms),
            boat,
            boat_rx,
            observer,
            observer_rx,
        }
    }

    #[test]
    fn test_resolve_room() {
        let f = fixture();
        assert_eq!(
            f.router.resolve_room(f.observer.id),
            Ok(RoomRef { boat_emblem: "ALPHA".to_string(), role: Role::Observer })
        );
        assert_eq!(f.router.resolve_room(uuid::Uuid::new_v4()), Err(RoutingMiss));
    }

    #[test]
    fn test_observer_commands_reach_boat() {
        let mut f = fixture();

        let outcome = f.router.route(f.observer.id, Frame::new("command", r#"{"type":"full_meta"}"#));
        assert_eq!(
            outcome,
            RouteOutcome::Forwarded { room: "ALPHA-boat".to_string(), delivered: 1 }
        );
        f.router.route(f.observer.id, Frame::new("setup", "{}"));

        assert_eq!(f.boat_rx.try_recv().unwrap(), Frame::new("command", r#"{"type":"full_meta"}"#));
        assert_eq!(f.boat_rx.try_recv().unwrap(), Frame::new("setup", "{}"));
        assert!(f.observer_rx.try_recv().is_err());
    }

    #[test]
    fn test_boat_data_reaches_observers_unmodified() {
        let mut f = fixture();
        let payload = r#"{"gps":{"lat":47.1,"lng":9.4}} "#;

        let outcome = f.router.route(f.boat.id, Frame::new("data", payload));

        assert!(matches!(outcome, RouteOutcome::Forwarded { delivered: 1, .. }));
        assert_eq!(f.observer_rx.try_recv().unwrap().data, payload);
        assert!(f.boat_rx.try_recv().is_err());
    }

    #[test]
    fn test_wrong_direction_is_dropped() {
        let mut f = fixture();

        assert_eq!(f.router.route(f.boat.id, Frame::new("command", "x")), RouteOutcome::WrongDirection);
        assert_eq!(f.router.route(f.boat.id, Frame::new("setup", "x")), RouteOutcome::WrongDirection);
        assert_eq!(f.router.route(f.observer.id, Frame::new("data", "x")), RouteOutcome::WrongDirection);

        assert!(f.boat_rx.try_recv().is_err());
        assert!(f.observer_rx.try_recv().is_err());
    }

    #[test]
    fn test_unroutable_and_unknown_events() {
        let f = fixture();
        let stranger = uuid::Uuid::new_v4();

        assert_eq!(f.router.route(stranger, Frame::new("command", "x")), RouteOutcome::Unroutable);
        assert_eq!(f.router.route(f.observer.id, Frame::new("online", "true")), RouteOutcome::UnknownEvent);
    }

    #[tokio::test]
    async fn test_telemetry_sink_records_sample() {
        let store = Arc::new(MemoryTripStore::default());
        let directory = Arc::new(MemoryDirectory::default().with_boat(1, "ALPHA"));
        let segmenter = Arc::new(TripSegmenter::new(store.clone()));
        let sink = TelemetrySink::new(segmenter, directory, 20);

        let received_at = Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap();

        sink.persist("ALPHA", Sample::new(received_at, r#"{"speed":3}"#)).await.unwrap();
        sink.persist("NOBODY", Sample::new(received_at, "{}")).await.unwrap();

        let trips = store.trips();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].boat_id, 1);
        let datapoints = store.find_datapoints_by_trip(trips[0].trip_id).await.unwrap();
        assert_eq!(datapoints.len(), 1);
        assert_eq!(datapoints[0].data, r#"{"speed":3}"#);
        assert_eq!(datapoints[0].timestamp, received_at);
    }

    async fn wait_for_datapoints(store: &MemoryTripStore, count: usize) {
        for _ in 0..200 {
            if store.datapoints().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_data_route_persists_non_empty_payloads() {
        let mut f = fixture();
        let store = Arc::new(MemoryTripStore::default());
        let directory = Arc::new(MemoryDirectory::default().with_boat(1, "ALPHA"));
        let sink = Arc::new(TelemetrySink::new(
            Arc::new(TripSegmenter::new(store.clone())),
            directory,
            20,
        ));
        let router = f.router.with_telemetry(sink);
        let before = Utc::now();

        router.route(f.boat.id, Frame::new("data", r#"{"speed": 4.20}"#));
        wait_for_datapoints(&store, 1).await;

        let trips = store.trips();
        assert_eq!(trips.len(), 1);
        let datapoints = store.datapoints();
        assert_eq!(datapoints.len(), 1);
        assert_eq!(datapoints[0].trip_id, trips[0].trip_id);
        assert_eq!(datapoints[0].data, r#"{"speed": 4.20}"#);
        assert!(datapoints[0].timestamp >= before);

        // forwarded, but nothing to save
        let outcome = router.route(f.boat.id, Frame::new("data", ""));
        assert!(matches!(outcome, RouteOutcome::Forwarded { delivered: 1, .. }));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.trips().len(), 1);
        assert_eq!(store.datapoints().len(), 1);
        assert_eq!(f.observer_rx.try_recv().unwrap().data, r#"{"speed": 4.20}"#);
        assert_eq!(f.observer_rx.try_recv().unwrap().data, "");
    }

    #[tokio::test]
    async fn test_data_route_with_telemetry_still_forwards() {
        let mut f = fixture();
        let store = Arc::new(MemoryTripStore::default());
        let directory = Arc::new(MemoryDirectory::default().with_boat(1, "ALPHA"));
        let sink = Arc::new(TelemetrySink::new(
            Arc::new(TripSegmenter::new(store.clone())),
            directory,
            20,
        ));
        let router = f.router.with_telemetry(sink);

        let outcome = router.route(f.boat.id, Frame::new("data", "{}"));

        assert!(matches!(outcome, RouteOutcome::Forwarded { delivered: 1, .. }));
        assert_eq!(f.observer_rx.try_recv().unwrap().data, "{}");
    }
}
