use crate::error::{ConfigErrorKind, InfraError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub http_host: String,          // e.g. "127.0.0.1"
    #[serde(default = "default_port")]
    pub http_port: u16,             // e.g. 5174
    #[serde(default = "default_rooms_dir")]
    pub rooms_dir: PathBuf,         // e.g. "rooms"
    #[serde(default = "default_dialogue_dir")]
    pub dialogue_dir: PathBuf,      // e.g. "dialogue"
    #[serde(default)]
    pub default_room: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5174
}

fn default_rooms_dir() -> PathBuf {
    PathBuf::from("rooms")
}

fn default_dialogue_dir() -> PathBuf {
    PathBuf::from("dialogue")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: default_host(),
            http_port: default_port(),
            rooms_dir: default_rooms_dir(),
            dialogue_dir: default_dialogue_dir(),
            default_room: None,
        }
    }
}

impl Config {
    #[allow(unused)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InfraError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Read(e),
        })?;
        let cfg: Self = toml::from_str(&data).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Parse(e),
        })?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self, InfraError> {
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(get: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_port = match non_empty("DEV_PERSIST_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| InfraError::Config {
                path: PathBuf::from(".env"),
                source: ConfigErrorKind::InvalidEnv("DEV_PERSIST_PORT".into(), e.to_string()),
            })?,
            None => default_port(),
        };

        Ok(Self {
            http_host: non_empty("DEV_PERSIST_HOST").unwrap_or_else(default_host),
            http_port,
            rooms_dir: non_empty("ROOMS_DIR").map(PathBuf::from).unwrap_or_else(default_rooms_dir),
            dialogue_dir: non_empty("DIALOGUE_DIR").map(PathBuf::from).unwrap_or_else(default_dialogue_dir),
            default_room: non_empty("DEFAULT_ROOM"),
        })
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
