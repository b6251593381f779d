use crate::error::DomainError;
use crate::import::DocFormat;
use crate::services::ServiceError;
use crate::state::registry::RoomRegistry;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

static ROOM_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid room id regex"));

pub const DEFAULT_WIDTH: f64 = 320.0;
pub const DEFAULT_HEIGHT: f64 = 180.0;
pub const DEFAULT_BACKGROUND: &str = "#000000";

pub fn validate_room_id(id: &str) -> Result<(), DomainError> {
    if ROOM_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(DomainError::InvalidRoomId(id.to_string()))
    }
}

/// Where room documents live.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn load_document(&self, room_id: &str) -> Result<Value, ServiceError>;

    /// Persist and return the written path.
    async fn save_document(&self, room_id: &str, doc: &Value) -> Result<PathBuf, ServiceError>;
}

/// Shape an editor-submitted room object into a complete document.
pub fn normalise_document(room_id: &str, room: &Value) -> Result<Value, ServiceError> {
    let Some(raw) = room.as_object() else {
        return Err(ServiceError::InvalidInput("Expected body: { room: object }".into()));
    };

    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(room_id);
    let number = |key: &str, fallback: f64| {
        raw.get(key)
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
            .unwrap_or(fallback)
    };
    let array = |key: &str| raw.get(key).filter(|v| v.is_array()).cloned().unwrap_or_else(|| json!([]));

    let mut out = Map::new();
    out.insert("id".into(), json!(room_id));
    out.insert("name".into(), json!(name));
    out.insert("width".into(), json!(number("width", DEFAULT_WIDTH)));
    out.insert("height".into(), json!(number("height", DEFAULT_HEIGHT)));
    out.insert(
        "backgroundColor".into(),
        json!(raw.get("backgroundColor").and_then(Value::as_str).unwrap_or(DEFAULT_BACKGROUND)),
    );
    out.insert("hotspots".into(), array("hotspots"));
    out.insert("scripts".into(), array("scripts"));

    for key in ["interactionChart", "parallelStateChart", "perspective"] {
        if let Some(v) = raw.get(key).filter(|v| v.is_object()) {
            out.insert(key.into(), v.clone());
        }
    }
    if let Some(v) = raw
        .get("genericChart")
        .or_else(|| raw.get("xstateChart"))
        .filter(|v| v.is_object())
    {
        out.insert("genericChart".into(), v.clone());
    }
    out.insert("walkablePolygon".into(), array("walkablePolygon"));
    if let Some(text) = raw.get("overlayText").filter(|v| v.is_string()) {
        out.insert("overlayText".into(), text.clone());
    }

    Ok(Value::Object(out))
}

/// Room documents on disk. A room keeps the file (and format) it was
/// loaded from; new rooms land in `{dir}/{id}.json`.
pub struct FileRoomStore {
    dir: PathBuf,
    rooms: Arc<RoomRegistry>,
}

impl FileRoomStore {
    pub fn new(dir: PathBuf, rooms: Arc<RoomRegistry>) -> Self {
        Self { dir, rooms }
    }

    pub fn path_for(&self, room_id: &str) -> PathBuf {
        self.rooms
            .source_path(room_id)
            .unwrap_or_else(|| self.dir.join(format!("{}.json", room_id)))
    }
}

#[async_trait]
impl RoomStore for FileRoomStore {
    async fn load_document(&self, room_id: &str) -> Result<Value, ServiceError> {
        validate_room_id(room_id)?;
        let path = self.path_for(room_id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServiceError::NotFound { entity: "room" });
            }
            Err(e) => return Err(e.into()),
        };
        let doc = match DocFormat::from_path(&path) {
            DocFormat::Json => serde_json::from_str(&text).map_err(DomainError::from)?,
            DocFormat::Yaml => serde_yaml::from_str(&text).map_err(DomainError::from)?,
        };
        Ok(doc)
    }

    async fn save_document(&self, room_id: &str, doc: &Value) -> Result<PathBuf, ServiceError> {
        validate_room_id(room_id)?;
        let path = self.path_for(room_id);
        let text = match DocFormat::from_path(&path) {
            DocFormat::Json => format!("{}\n", serde_json::to_string_pretty(doc).map_err(DomainError::from)?),
            DocFormat::Yaml => serde_yaml::to_string(doc).map_err(DomainError::from)?,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, text).await?;
        self.rooms.set_source_path(room_id.into(), path.clone());
        debug!(%room_id, file = %path.display(), "room document written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::test_support::{mk_hotspot, mk_room};
    use tempfile::TempDir;

    fn mk_store(dir: &TempDir) -> (FileRoomStore, Arc<RoomRegistry>) {
        let rooms = Arc::new(RoomRegistry::from_rooms(vec![mk_room("room1", vec![mk_hotspot("door", "Door")])]).unwrap());
        (FileRoomStore::new(dir.path().to_path_buf(), rooms.clone()), rooms)
    }

    #[test]
    fn room_id_pattern() {
        assert!(validate_room_id("room_1-b").is_ok());
        assert!(validate_room_id("").is_err());
        assert!(validate_room_id("../etc").is_err());
        assert!(validate_room_id("a b").is_err());
    }

    #[test]
    fn normalise_fills_defaults_and_forces_id() {
        let doc = normalise_document("room7", &json!({"id": "other", "name": "  ", "width": "wide"})).unwrap();
        assert_eq!(doc["id"], "room7");
        assert_eq!(doc["name"], "room7");
        assert_eq!(doc["width"], 320.0);
        assert_eq!(doc["height"], 180.0);
        assert_eq!(doc["backgroundColor"], "#000000");
        assert_eq!(doc["hotspots"], json!([]));
        assert_eq!(doc["walkablePolygon"], json!([]));
        assert!(doc.get("interactionChart").is_none());
    }

    #[test]
    fn normalise_keeps_known_sections_and_renames_legacy_chart() {
        let doc = normalise_document(
            "room1",
            &json!({"name": "R", "xstateChart": {"initial": "a", "states": {"a": {}}},
                    "overlayText": "Hi", "perspective": {"farY": 1}, "junk": true}),
        )
        .unwrap();
        assert_eq!(doc["genericChart"]["initial"], "a");
        assert!(doc.get("xstateChart").is_none());
        assert_eq!(doc["overlayText"], "Hi");
        assert!(doc.get("perspective").is_some());
        assert!(doc.get("junk").is_none());
    }

    #[test]
    fn normalise_rejects_non_objects() {
        assert!(matches!(normalise_document("r", &json!([1])), Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn new_rooms_are_written_as_json_in_the_rooms_dir() {
        let dir = TempDir::new().unwrap();
        let (store, rooms) = mk_store(&dir);
        assert!(matches!(store.load_document("attic").await, Err(ServiceError::NotFound { .. })));

        let path = store.save_document("attic", &json!({"id": "attic"})).await.unwrap();
        assert_eq!(path, dir.path().join("attic.json"));
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
        assert_eq!(rooms.source_path("attic"), Some(path));
        assert_eq!(store.load_document("attic").await.unwrap()["id"], "attic");
    }

    #[tokio::test]
    async fn yaml_sources_stay_yaml() {
        let dir = TempDir::new().unwrap();
        let (store, rooms) = mk_store(&dir);
        let source = dir.path().join("room1.yaml");
        rooms.set_source_path("room1".into(), source.clone());

        let path = store.save_document("room1", &json!({"id": "room1", "name": "Hall"})).await.unwrap();
        assert_eq!(path, source);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("name: Hall"));
        assert_eq!(store.load_document("room1").await.unwrap()["name"], "Hall");
    }

    #[tokio::test]
    async fn bad_ids_never_touch_disk() {
        let dir = TempDir::new().unwrap();
        let (store, _) = mk_store(&dir);
        let err = store.save_document("../escape", &json!({})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidRoomId(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
