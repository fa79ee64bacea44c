use super::ScriptLibrary;
use crate::core::error::LibraryResult;
use crate::core::model::{empty_asset_index, AssetIndex, FALLBACK_ASSET_CATEGORY};
use crate::core::paths::{self, ASSET_DIRS};
use anyhow::Context;
use walkdir::WalkDir;

impl ScriptLibrary {
    /// Groups every file under the assets folder by its top-level folder.
    ///
    /// The five default categories always come first, possibly empty; every
    /// other top-level folder becomes a category too, even an empty one, in
    /// the order it is met. Files sitting directly in the assets folder go to
    /// `Other`.
    pub fn list_assets(&self, script_id: &str) -> LibraryResult<AssetIndex> {
        let script_dir = self.script_dir(script_id)?;
        let mut index = empty_asset_index();
        let Some(assets_dir) = paths::first_existing_dir(&script_dir, &ASSET_DIRS) else {
            return Ok(index);
        };

        for entry in WalkDir::new(&assets_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", assets_dir.display()))?;
            if entry.file_type().is_dir() {
                if entry.depth() == 1 {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    index.entry(name).or_default();
                }
                continue;
            }
            // Symlinked files are listed, symlinked folders are not descended into.
            if !entry.path().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&assets_dir) else {
                continue;
            };
            let rel = paths::to_posix(rel);
            let category = match rel.split_once('/') {
                Some((top, _)) => top.to_string(),
                None => FALLBACK_ASSET_CATEGORY.to_string(),
            };
            index.entry(category).or_default().push(rel);
        }
        Ok(index)
    }
}
