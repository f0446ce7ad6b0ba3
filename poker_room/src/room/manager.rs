//! Room registry for spawning and tracking room actors.

use log::{debug, info};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{RoomId, RoomSummary},
    state::{DealerFactory, Room, shuffled_dealers},
};

/// Process-wide map of live rooms. Rooms are created on first use and
/// removed once their last connection leaves.
pub struct RoomRegistry {
    /// Configuration for every new room
    config: RoomConfig,

    /// Dealer source handed to every new room
    dealers: DealerFactory,

    /// Active room handles
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
}

impl RoomRegistry {
    /// Create a new room registry
    pub fn new(config: RoomConfig) -> Self {
        Self::with_dealers(config, shuffled_dealers())
    }

    /// Registry whose rooms deal from `dealers` instead of a shuffled deck.
    pub fn with_dealers(config: RoomConfig, dealers: DealerFactory) -> Self {
        Self {
            config,
            dealers,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Get the live room for `room_id`, spawning it if there is none.
    ///
    /// A handle whose actor has already shut down is replaced.
    pub async fn get_or_create(&self, room_id: &str) -> RoomHandle {
        if let Some(handle) = self.get(room_id).await {
            return handle;
        }

        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(room_id).filter(|h| !h.is_closed()) {
            return handle.clone();
        }

        let room = Room::with_dealers(room_id, self.config.clone(), self.dealers.clone());
        let (actor, handle) = RoomActor::new(room);
        tokio::spawn(actor.run());
        rooms.insert(room_id.to_string(), handle.clone());
        info!("Created room {} ({} live)", room_id, rooms.len());
        handle
    }

    /// Get a live room handle by ID
    pub async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).filter(|h| !h.is_closed()).cloned()
    }

    /// Forget a room that reported itself empty. Only removes the entry if
    /// it still points at that same actor.
    pub async fn remove(&self, handle: &RoomHandle) -> bool {
        let mut rooms = self.rooms.write().await;
        let matches = rooms
            .get(handle.room_id())
            .is_some_and(|current| current.same_room(handle));
        if matches {
            rooms.remove(handle.room_id());
            info!("Removed room {} ({} live)", handle.room_id(), rooms.len());
        } else {
            debug!("Room {} already replaced or removed", handle.room_id());
        }
        matches
    }

    /// Number of registered rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Summaries of every live room, sorted by ID
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }
}
