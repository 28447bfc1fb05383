//! Small filesystem primitives shared by the move and restore engines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Moves a file, falling back to copy+delete when the rename crosses a
/// filesystem boundary.
///
/// The fallback is not atomic; the spec accepts copy+delete semantics across
/// volumes.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}

/// Resolves a destination path that does not collide with an existing file.
///
/// If `candidate` is free it is returned unchanged. Otherwise a numeric
/// suffix is inserted before the extension, counting up from 1 until a free
/// name is found: `a.txt` becomes `a_1.txt`, `a_2.txt`, … The `infix` is the
/// text between the stem and the counter (`"_"` for moves, `"_restored_"`
/// for restores).
pub fn collision_free_path(candidate: &Path, infix: &str) -> PathBuf {
    if !candidate.exists() {
        return candidate.to_path_buf();
    }

    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let extension = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1;
    loop {
        let name = format!("{}{}{}{}", stem, infix, counter, extension);
        let numbered = parent.join(name);
        if !numbered.exists() {
            return numbered;
        }
        counter += 1;
    }
}

/// Returns true when the directory exists and contains no entries.
pub fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
