use crate::hardening::{ALLOW_SYMLINKS, MAX_FILE_BYTES, MAX_ROOM_FILES, ROOM_EXTENSIONS};
use anyhow::{Context, bail};
use std::fs;
use std::path::{Path, PathBuf};

pub fn has_room_extension(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| ROOM_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Room documents in `dir`, sorted by path, with size and count guards.
pub fn list_room_files_guarded(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for e in fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
        let e = e?;
        let p = e.path();
        if !has_room_extension(&p) {
            continue;
        }

        let md = fs::symlink_metadata(&p)?;
        if md.file_type().is_symlink() && !ALLOW_SYMLINKS {
            continue;
        }
        if !p.is_file() {
            continue;
        }

        let len = fs::metadata(&p)?.len() as usize;
        if len > MAX_FILE_BYTES {
            bail!("file too large: {} ({} bytes)", p.display(), len);
        }

        files.push(p);
        if files.len() > MAX_ROOM_FILES {
            bail!("too many room files (> {})", MAX_ROOM_FILES);
        }
    }
    files.sort();
    Ok(files)
}
