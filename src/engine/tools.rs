//! Path helpers shared by the visitors.

use std::io;
use std::path::{Path, PathBuf};

use crate::types::strip_os_suffix;

/// Dot-files and dot-directories.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// `path` with `suffix` appended to its final component.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Strip `suffix` from the file name of `path`, or `None` if it does not end with it
/// (or the name is nothing but the suffix).
pub fn strip_backup_suffix(path: &Path, suffix: &str) -> Option<PathBuf> {
    if suffix.is_empty() {
        return None;
    }
    let original = strip_os_suffix(path.file_name()?, suffix)?;
    if original.is_empty() {
        return None;
    }
    Some(path.with_file_name(original))
}

#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
pub fn create_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
