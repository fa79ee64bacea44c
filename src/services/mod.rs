//! Maps the on-disk scripts folder onto scripts, chapters, characters and assets.
//!
//! ```text
//! scripts/
//!   <script_id>/
//!     story_config.yaml
//!     Charpters|Chapters/
//!     Characters/
//!     Assets|Assests/
//! ```
//!
//! Nothing is cached, every call reads the filesystem again. Concurrent writers
//! to the same file are not coordinated.

use crate::core::error::{LibraryError, LibraryResult};
use crate::core::paths;
use std::path::{Path, PathBuf};

pub mod assets;
pub mod chapters;
pub mod characters;
pub mod projects;

#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    root: PathBuf,
}

impl ScriptLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `<root>/<script_id>`, failing with `NotFound` when it is missing.
    pub fn script_dir(&self, script_id: &str) -> LibraryResult<PathBuf> {
        let dir = self.root.join(paths::script_segment(script_id)?);
        if !dir.is_dir() {
            return Err(LibraryError::not_found("Script not found"));
        }
        Ok(dir)
    }
}
