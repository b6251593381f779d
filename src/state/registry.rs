use crate::config::Config;
use crate::error::{AppResult, DomainError};
use crate::import::{RoomSet, load_rooms_dir};
use crate::models::flags::{self, Flags};
use crate::models::room::{Hotspot, RoomDefinition};
use crate::models::types::RoomId;
use crate::services::lines::DialogueCatalog;
use crate::services::{FileRoomStore, InteractionResolver, RoomService, RoomStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Loaded rooms keyed by id. Readers get `Arc` snapshots; the dev editor
/// and the persistence API swap in whole new room values.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<BTreeMap<RoomId, Arc<RoomDefinition>>>,
    sources: RwLock<BTreeMap<RoomId, PathBuf>>,
    default_room: RoomId,
}

impl RoomRegistry {
    pub fn from_set(set: RoomSet) -> Self {
        let rooms = set.rooms.into_iter().map(|(k, v)| (k, Arc::new(v))).collect();
        Self {
            rooms: RwLock::new(rooms),
            sources: RwLock::new(set.sources),
            default_room: set.default_room,
        }
    }

    /// In-memory registry; the first room (or `room1`) becomes the default.
    pub fn from_rooms(rooms: Vec<RoomDefinition>) -> AppResult<Self> {
        let mut map = BTreeMap::new();
        for room in rooms {
            if map.contains_key(&room.id) {
                return Err(DomainError::DuplicateRoom {
                    room_id: room.id.clone(),
                    source_name: "<memory>".to_string(),
                });
            }
            map.insert(room.id.clone(), room);
        }
        let default_room = crate::import::pick_default_room(map.keys(), None)?;
        Ok(Self::from_set(RoomSet {
            rooms: map,
            sources: BTreeMap::new(),
            default_room,
        }))
    }

    pub fn get(&self, id: &str) -> Option<Arc<RoomDefinition>> {
        self.rooms.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.read().contains_key(id)
    }

    pub fn default_room(&self) -> &RoomId {
        &self.default_room
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }

    pub fn source_path(&self, id: &str) -> Option<PathBuf> {
        self.sources.read().get(id).cloned()
    }

    pub fn set_source_path(&self, id: RoomId, path: PathBuf) {
        self.sources.write().insert(id, path);
    }

    /// Swap in a new version of a room (hot reload after save).
    pub fn replace(&self, room: RoomDefinition) -> Option<Arc<RoomDefinition>> {
        let id = room.id.clone();
        info!(room_id = %id, "room replaced");
        self.rooms.write().insert(id, Arc::new(room))
    }

    /// Edit one hotspot in place. Rule data is shared with the previous
    /// version, so chart instances survive geometry edits. The id is fixed;
    /// a rename is rejected and leaves the room untouched.
    pub fn update_hotspot<F>(&self, room_id: &str, hotspot_id: &str, f: F) -> AppResult<Arc<RoomDefinition>>
    where
        F: FnOnce(&mut Hotspot),
    {
        let mut rooms = self.rooms.write();
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| DomainError::RoomNotFound(RoomId::from(room_id)))?;
        let mut edited = entry
            .hotspot(hotspot_id)
            .cloned()
            .ok_or_else(|| DomainError::HotspotNotFound(hotspot_id.into()))?;
        f(&mut edited);
        if edited.id != hotspot_id {
            return Err(DomainError::validation(
                "hotspot.id",
                format!("cannot rename \"{}\" to \"{}\"", hotspot_id, edited.id),
            ));
        }
        if let Some(slot) = Arc::make_mut(entry).hotspot_mut(hotspot_id) {
            *slot = edited;
        }
        Ok(entry.clone())
    }

    /// False only once a hotspot's taken flag is set. Unknown rooms and
    /// hotspots are visible.
    pub fn is_hotspot_visible(&self, room_id: &str, hotspot_id: &str, f: &Flags) -> bool {
        let Some(room) = self.get(room_id) else {
            return true;
        };
        if room.hotspot(hotspot_id).is_none() {
            return true;
        }
        !flags::is_set(f, &flags::taken_flag(hotspot_id))
    }

    pub fn visible_hotspots(&self, room_id: &str, f: &Flags) -> Vec<Hotspot> {
        let Some(room) = self.get(room_id) else {
            return Vec::new();
        };
        room.hotspots
            .iter()
            .filter(|h| !flags::is_set(f, &flags::taken_flag(h.id.as_str())))
            .cloned()
            .collect()
    }
}

pub struct Services {
    pub room: Arc<RoomService>,
    pub resolver: Arc<InteractionResolver>,
}

/// Everything a binary needs, wired once at startup.
pub struct Registry {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
    pub services: Arc<Services>,
}

impl Registry {
    pub fn new(config: Arc<Config>, rooms: Arc<RoomRegistry>, lines: DialogueCatalog) -> Self {
        let store: Arc<dyn RoomStore> = Arc::new(FileRoomStore::new(config.rooms_dir.clone(), rooms.clone()));
        let services = Arc::new(Services {
            room: Arc::new(RoomService::new(store, rooms.clone())),
            resolver: Arc::new(InteractionResolver::new(Arc::new(lines))),
        });
        Self {
            config,
            rooms,
            services,
        }
    }

    /// Load rooms and dialogue from the configured directories.
    pub fn load(config: Arc<Config>) -> anyhow::Result<Self> {
        let set = load_rooms_dir(&config.rooms_dir, config.default_room.as_deref())?;
        let rooms = Arc::new(RoomRegistry::from_set(set));
        let lines = DialogueCatalog::load_dir(&config.dialogue_dir);
        Ok(Self::new(config, rooms, lines))
    }
}
