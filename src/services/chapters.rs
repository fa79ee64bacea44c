use super::ScriptLibrary;
use crate::core::codec::{read_yaml, write_yaml};
use crate::core::error::{LibraryError, LibraryResult};
use crate::core::model::Chapter;
use crate::core::paths::{self, CHAPTER_DIRS};
use anyhow::Context;
use log::info;
use serde_yaml_ng::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn chapter_not_found(chapter_path: &str) -> LibraryError {
    LibraryError::NotFound(format!("Chapter file not found: {}", chapter_path))
}

impl ScriptLibrary {
    fn chapters_dir(&self, script_dir: &Path) -> Option<PathBuf> {
        paths::first_existing_dir(script_dir, &CHAPTER_DIRS)
    }

    fn find_chapter(&self, script_id: &str, chapter_path: &str) -> LibraryResult<PathBuf> {
        let rel = paths::relative_path(chapter_path)?;
        let chapters_dir = self
            .chapters_dir(&self.script_dir(script_id)?)
            .ok_or_else(|| LibraryError::not_found("Chapters directory not found"))?;
        let file = paths::with_yaml_extension(chapters_dir.join(rel));
        paths::existing_chapter_file(&file).ok_or_else(|| chapter_not_found(chapter_path))
    }

    /// Chapter files relative to the chapters folder, with `/` separators.
    /// A script without a chapters folder has no chapters.
    pub fn list_chapters(&self, script_id: &str) -> LibraryResult<Vec<String>> {
        let script_dir = self.script_dir(script_id)?;
        let Some(chapters_dir) = self.chapters_dir(&script_dir) else {
            return Ok(Vec::new());
        };

        let mut chapters = Vec::new();
        for entry in WalkDir::new(&chapters_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", chapters_dir.display()))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !(name.ends_with(".yaml") || name.ends_with(".yml")) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&chapters_dir) {
                chapters.push(paths::to_posix(rel));
            }
        }
        Ok(chapters)
    }

    /// Reads a chapter as an untyped document. `intro` resolves to `intro.yaml`,
    /// then `intro.yml`.
    pub fn get_chapter(&self, script_id: &str, chapter_path: &str) -> LibraryResult<Value> {
        let file = self.find_chapter(script_id, chapter_path)?;
        Ok(read_yaml(&file)?)
    }

    /// Writes a chapter, replacing whatever is there. Missing folders are
    /// created; a script without a chapters folder gets `Charpters`.
    pub fn save_chapter(
        &self,
        script_id: &str,
        chapter_path: &str,
        chapter: &Chapter,
    ) -> LibraryResult<()> {
        let rel = paths::relative_path(chapter_path)?;
        let script_dir = self.script_dir(script_id)?;
        let chapters_dir = self
            .chapters_dir(&script_dir)
            .unwrap_or_else(|| script_dir.join(CHAPTER_DIRS[0]));

        let file = paths::with_yaml_extension(chapters_dir.join(rel));
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        write_yaml(&file, chapter)?;
        info!("Saved chapter {} of {}", chapter_path, script_id);
        Ok(())
    }

    /// Removes a chapter file. Emptied parent folders are left in place.
    pub fn delete_chapter(&self, script_id: &str, chapter_path: &str) -> LibraryResult<()> {
        let file = self.find_chapter(script_id, chapter_path)?;
        fs::remove_file(&file).with_context(|| format!("Failed to delete chapter: {}", file.display()))?;
        info!("Deleted chapter {} of {}", chapter_path, script_id);
        Ok(())
    }
}
