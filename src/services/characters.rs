use super::ScriptLibrary;
use crate::core::codec::read_toml;
use crate::core::error::LibraryResult;
use crate::core::model::{Character, Listing};
use crate::core::paths::{self, CHARACTER_DIR};
use walkdir::WalkDir;

impl ScriptLibrary {
    /// The `[role]` table of every `.toml` file under `Characters`, tagged with
    /// its relative `_path` and an `id` (`unknown_<file>` when the role has none).
    /// Files without a role table are ignored; unreadable ones end up in `skipped`.
    pub fn list_characters(&self, script_id: &str) -> LibraryResult<Listing<Character>> {
        let chars_dir = self.script_dir(script_id)?.join(CHARACTER_DIR);
        let mut listing = Listing::default();
        if !chars_dir.is_dir() {
            return Ok(listing);
        }

        for entry in WalkDir::new(&chars_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(&chars_dir).to_path_buf();
                    listing.skip(path, e);
                    continue;
                }
            };
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".toml") || !entry.path().is_file() {
                continue;
            }

            let mut document = match read_toml(entry.path()) {
                Ok(document) => document,
                Err(e) => {
                    listing.skip(entry.path().to_path_buf(), format!("{:#}", e));
                    continue;
                }
            };
            let mut role = match document.remove("role") {
                None => continue,
                Some(toml::Value::Table(role)) => role,
                Some(_) => {
                    listing.skip(entry.path().to_path_buf(), "`role` is not a table");
                    continue;
                }
            };

            let rel = entry.path().strip_prefix(&chars_dir).unwrap_or(entry.path());
            role.insert("_path".to_string(), paths::to_posix(rel).into());
            if !role.contains_key("id") {
                role.insert("id".to_string(), format!("unknown_{}", file_name).into());
            }
            listing.items.push(role);
        }
        Ok(listing)
    }
}
