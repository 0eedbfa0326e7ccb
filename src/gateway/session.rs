use std::sync::Arc;

use tracing::{debug, info, warn};

use super::admission::{AdmissionPipeline, AuthRejection, ConnectParams};
use super::events::Frame;
use super::presence::PresenceState;
use super::rooms::{boat_room, user_room, ConnectionHandle, ConnectionId, RoomRegistry};
use crate::models::claim::Role;

/// An authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub role: Role,
    pub boat_emblem: String,
}

/// Admits connections into their rooms and cleans up after them.
pub struct SessionGateway {
    admission: AdmissionPipeline,
    rooms: Arc<RoomRegistry>,
    presence: Arc<PresenceState>,
}

impl SessionGateway {
    pub fn new(
        admission: AdmissionPipeline,
        rooms: Arc<RoomRegistry>,
        presence: Arc<PresenceState>,
    ) -> Self {
        Self {
            admission,
            rooms,
            presence,
        }
    }

    /// On rejection nothing is joined or recorded; the caller closes the socket.
    pub async fn on_connect(
        &self,
        handle: &ConnectionHandle,
        params: &ConnectParams,
    ) -> Result<Session, AuthRejection> {
        let admission = match self.admission.evaluate(params).await {
            Ok(admission) => admission,
            Err(rejection) => {
                warn!(
                    "Rejected connection {} for boat '{}': {}",
                    handle.id, params.boat_emblem, rejection
                );
                return Err(rejection);
            }
        };
        let emblem = admission.boat_emblem.as_str();

        match admission.role {
            Role::Boat => {
                self.presence.set_online(emblem);
                self.rooms.join(&boat_room(emblem), handle);
                self.presence.bind_session(handle.id, emblem);
                info!("Boat {} connected ({})", emblem, handle.id);

                self.rooms.broadcast(&user_room(emblem), Frame::presence(true));
            }
            Role::Observer => {
                self.rooms.join(&user_room(emblem), handle);
                info!(
                    "Observer connected to {} ({}), boat online: {}",
                    emblem,
                    handle.id,
                    self.presence.is_online(emblem)
                );

                // Goes to the whole room; earlier observers simply hear it again.
                if self.rooms.room_len(&boat_room(emblem)) != 0 {
                    self.rooms.broadcast(&user_room(emblem), Frame::presence(true));
                }
            }
        }

        Ok(Session {
            connection_id: handle.id,
            role: admission.role,
            boat_emblem: admission.boat_emblem,
        })
    }

    /// Idempotent. Only boat connections produce an offline notification.
    pub fn on_disconnect(&self, connection_id: ConnectionId) -> Option<String> {
        self.rooms.leave_all(connection_id);

        let Some(emblem) = self.presence.take_session(connection_id) else {
            debug!("Connection {} closed", connection_id);
            return None;
        };

        self.presence.set_offline(&emblem);
        info!("Boat {} disconnected ({})", emblem, connection_id);
        self.rooms.broadcast(&user_room(&emblem), Frame::presence(false));

        Some(emblem)
    }
}
