/// Maximum number of room files loaded from one directory
pub const MAX_ROOM_FILES: usize = 256;
/// Maximum size of a single room document in bytes
pub const MAX_FILE_BYTES: usize = 1024 * 1024;          // 1 MiB per room
/// Maximum size of an HTTP request body in bytes
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
/// Whether symlinked room files are followed
pub const ALLOW_SYMLINKS: bool = false;

/// File extensions accepted as room documents
pub const ROOM_EXTENSIONS: &[&str] = &["json", "yml", "yaml"];
