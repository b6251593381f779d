use crate::models::types::{HotspotId, RoomId};
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Room document is structurally fine but semantically wrong
    #[error("validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    /// Two hotspots in the same room share an id
    #[error("duplicate hotspot id \"{hotspot_id}\" in room {room_id}")]
    DuplicateHotspot { room_id: RoomId, hotspot_id: HotspotId },

    /// Two room files declare the same room id
    #[error("duplicate room id \"{room_id}\" in {source_name}")]
    DuplicateRoom { room_id: RoomId, source_name: String },

    /// A chart refers to a state it never declares
    #[error("room {room_id}: {chart} references unknown state \"{state}\"")]
    UnknownInitialState {
        room_id: RoomId,
        chart: &'static str,
        state: String,
    },

    #[error("no room configuration files were loaded")]
    NoRooms,

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("hotspot not found: {0}")]
    HotspotNotFound(HotspotId),

    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("network issue: {0}")]
    Net(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
