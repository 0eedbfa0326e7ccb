use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::Frame;
use crate::models::claim::Role;

pub const BOAT_SUFFIX: &str = "-boat";
pub const USER_SUFFIX: &str = "-user";

pub type ConnectionId = Uuid;

pub fn boat_room(emblem: &str) -> String {
    format!("{}{}", emblem, BOAT_SUFFIX)
}

pub fn user_room(emblem: &str) -> String {
    format!("{}{}", emblem, USER_SUFFIX)
}

pub fn room_for(role: Role, emblem: &str) -> String {
    match role {
        Role::Boat => boat_room(emblem),
        Role::Observer => user_room(emblem),
    }
}

/// Boat emblem and side recovered from a room name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRef {
    pub boat_emblem: String,
    pub role: Role,
}

impl RoomRef {
    pub fn parse(room: &str) -> Option<Self> {
        let (emblem, role) = if let Some(emblem) = room.strip_suffix(BOAT_SUFFIX) {
            (emblem, Role::Boat)
        } else if let Some(emblem) = room.strip_suffix(USER_SUFFIX) {
            (emblem, Role::Observer)
        } else {
            return None;
        };

        if emblem.is_empty() {
            return None;
        }
        Some(Self {
            boat_emblem: emblem.to_string(),
            role,
        })
    }
}

/// Outbound side of one socket connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    sender: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Queues a frame without waiting. A full or closed queue drops it.
    pub fn deliver(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                warn!(
                    "Outbound queue of {} is full, dropping '{}' event",
                    self.id, frame.event
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Connection {} already closed", self.id);
                false
            }
        }
    }
}

/// Room name to member connections, plus the reverse index.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
    memberships: DashMap<ConnectionId, HashSet<String>>,
}

impl RoomRegistry {
    pub fn join(&self, room: &str, handle: &ConnectionHandle) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(handle.id, handle.clone());
        self.memberships
            .entry(handle.id)
            .or_default()
            .insert(room.to_string());
    }

    /// Removes the connection from every room it joined and returns those rooms.
    pub fn leave_all(&self, connection_id: ConnectionId) -> Vec<String> {
        let Some((_, joined)) = self.memberships.remove(&connection_id) else {
            return Vec::new();
        };

        for room in &joined {
            if let Some(mut members) = self.rooms.get_mut(room) {
                members.remove(&connection_id);
            }
            self.rooms.remove_if(room, |_, members| members.is_empty());
        }
        joined.into_iter().collect()
    }

    pub fn rooms_of(&self, connection_id: ConnectionId) -> Vec<String> {
        self.memberships
            .get(&connection_id)
            .map(|joined| joined.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_len(&self, room: &str) -> usize {
        self.rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }

    /// Fire-and-forget delivery to every member; returns how many accepted the frame.
    pub fn broadcast(&self, room: &str, frame: Frame) -> usize {
        // Snapshot members so no map guard is held while delivering.
        let members: Vec<ConnectionHandle> = match self.rooms.get(room) {
            Some(members) => members.values().cloned().collect(),
            None => return 0,
        };

        members
            .iter()
            .filter(|member| member.deliver(frame.clone()))
            .count()
    }
}
