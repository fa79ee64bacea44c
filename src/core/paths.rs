//! Translation between request identifiers and locations inside a script directory.
//!
//! Every identifier coming from a caller goes through [`script_segment`] or
//! [`relative_path`] before it is joined onto a base directory, so nothing can
//! escape the scripts folder.

use crate::core::error::{LibraryError, LibraryResult};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub const STORY_CONFIG_FILE: &str = "story_config.yaml";

/// Chapter folder names, preferred first.
pub const CHAPTER_DIRS: [&str; 2] = ["Charpters", "Chapters"];
/// Asset folder names, preferred first.
pub const ASSET_DIRS: [&str; 2] = ["Assets", "Assests"];
pub const CHARACTER_DIR: &str = "Characters";

/// Folders created for a new script. These use the legacy spellings on purpose,
/// existing editors and games read them.
pub const NEW_SCRIPT_DIRS: [&str; 3] = ["Assests", "Characters", "Charpters"];

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains(['/', '\\'])
}

/// Validates a script id: exactly one plain path segment.
pub fn script_segment(script_id: &str) -> LibraryResult<&str> {
    if script_id.is_empty() || script_id == "." || !is_plain_segment(script_id) {
        log::warn!("Rejected script id {:?}", script_id);
        return Err(LibraryError::InvalidPath(format!("script id {:?}", script_id)));
    }
    Ok(script_id)
}

/// Parses a caller-supplied relative path, accepting `/` and `\` as separators.
/// Empty and `.` segments are dropped; `..`, roots and drive prefixes are rejected.
pub fn relative_path(raw: &str) -> LibraryResult<PathBuf> {
    let mut path = PathBuf::new();
    for segment in raw.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || !is_plain_segment(segment) {
            log::warn!("Rejected relative path {:?}", raw);
            return Err(LibraryError::InvalidPath(raw.to_string()));
        }
        path.push(segment);
    }
    if path.as_os_str().is_empty() {
        return Err(LibraryError::InvalidPath(raw.to_string()));
    }
    Ok(path)
}

/// Renders a relative path with forward slashes regardless of host conventions.
pub fn to_posix(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the first of `names` that exists as a directory under `base`.
pub fn first_existing_dir(base: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| base.join(n)).find(|p| p.is_dir())
}

pub fn has_yaml_extension(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .is_some_and(|n| n.ends_with(".yaml") || n.ends_with(".yml"))
}

/// Appends `.yaml` unless the file name already ends in `.yaml` or `.yml`.
pub fn with_yaml_extension(path: PathBuf) -> PathBuf {
    if has_yaml_extension(&path) {
        return path;
    }
    let mut raw: OsString = path.into_os_string();
    raw.push(".yaml");
    PathBuf::from(raw)
}

/// Finds a chapter file on disk, trying the `.yml` twin of a missing `.yaml` file.
pub fn existing_chapter_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if path.extension().is_some_and(|ext| ext == "yaml") {
        let alt = path.with_extension("yml");
        if alt.is_file() {
            return Some(alt);
        }
    }
    None
}
