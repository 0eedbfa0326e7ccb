//! Real-time side of the service: admission of boat and observer
//! connections, room membership, presence and event routing.

pub mod admission;
pub mod events;
pub mod presence;
pub mod rooms;
pub mod router;
pub mod session;
