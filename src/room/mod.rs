//! Rooms, players and their registries

pub mod player;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod room;
pub mod timer;

pub use player::{Player, PlayerId, PlayerRegistry};
pub use registry::{RoomHandle, RoomRegistry};
pub use room::{JoinResult, Room, RoomId};
