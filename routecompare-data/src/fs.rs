//! Capability-based filesystem helpers built on `cap-std` and `camino`.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open the parent directory of `path` and return it with the file name.
pub(crate) fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create `path` and its ancestors if needed, then open it.
pub(crate) fn create_dir_all(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    let (base, relative) = base_dir_and_relative(path);
    let base_dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?;
    if relative.as_str().is_empty() {
        return Ok(base_dir);
    }
    base_dir.create_dir_all(&relative)?;
    base_dir.open_dir(&relative)
}

/// Split a path into an ambient base directory and a relative suffix.
fn base_dir_and_relative(path: &Utf8Path) -> (&'static str, Utf8PathBuf) {
    if path.is_absolute() {
        let relative = path.strip_prefix("/").unwrap_or(path);
        ("/", relative.to_path_buf())
    } else {
        (".", path.to_path_buf())
    }
}
