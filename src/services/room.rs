use crate::error::DomainError;
use crate::import::parse_room_value;
use crate::models::room::RoomDefinition;
use crate::services::ServiceError;
use crate::services::room_store::{RoomStore, normalise_document, validate_room_id};
use crate::state::registry::RoomRegistry;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct RoomService {
    store: Arc<dyn RoomStore>,
    rooms: Arc<RoomRegistry>,
}

impl RoomService {
    pub fn new(store: Arc<dyn RoomStore>, rooms: Arc<RoomRegistry>) -> Self {
        Self { store, rooms }
    }

    pub async fn get_document(&self, room_id: &str) -> Result<Value, ServiceError> {
        validate_room_id(room_id)?;
        self.store.load_document(room_id).await
    }

    /// Normalise, validate, write, then hot-swap the room in the registry.
    /// Nothing is written when validation fails.
    pub async fn save_document(&self, room_id: &str, room: &Value) -> Result<PathBuf, ServiceError> {
        validate_room_id(room_id)?;
        let doc = normalise_document(room_id, room)?;
        let parsed = parse_room_value(doc.clone())?;

        let path = self.store.save_document(room_id, &doc).await?;
        self.rooms.replace(parsed);
        info!(%room_id, file = %path.display(), "room saved");
        Ok(path)
    }

    /// Persist an in-memory room (dev editor).
    pub async fn save_room(&self, room: &RoomDefinition) -> Result<PathBuf, ServiceError> {
        let doc = serde_json::to_value(room).map_err(DomainError::from)?;
        self.save_document(room.id.as_str(), &doc).await
    }
}
