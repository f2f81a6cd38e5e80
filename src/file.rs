// src/file.rs

use std::{
    ffi::OsString,
    fs,
    io,
    path::Path,
};

/// Replace `path` with `contents` in one step: write a sibling temp file, then rename.
/// A crash mid-write leaves the previous version of `path` intact.
pub fn write_replace(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("table"));
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}
