use super::ScriptLibrary;
use crate::core::codec::{read_yaml, write_yaml};
use crate::core::error::{LibraryError, LibraryResult};
use crate::core::model::{Chapter, CreateScriptRequest, Listing, ScriptConfig, ScriptSettings};
use crate::core::paths::{self, STORY_CONFIG_FILE};
use anyhow::Context;
use log::info;
use std::fs;

impl ScriptLibrary {
    /// Every immediate subdirectory holding a `story_config.yaml`, sorted by id.
    /// Configs that fail to parse are reported in `skipped`.
    pub fn list_scripts(&self) -> LibraryResult<Listing<ScriptConfig>> {
        let mut listing = Listing::default();
        if !self.root.is_dir() {
            return Ok(listing);
        }

        let mut entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .collect::<Vec<_>>();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let config_path = entry.path().join(STORY_CONFIG_FILE);
            if !config_path.is_file() {
                continue;
            }
            match read_yaml::<ScriptConfig>(&config_path) {
                Ok(mut config) => {
                    config.id = Some(entry.file_name().to_string_lossy().into_owned());
                    listing.items.push(config);
                }
                Err(e) => listing.skip(config_path, format!("{:#}", e)),
            }
        }
        Ok(listing)
    }

    pub fn get_script(&self, script_id: &str) -> LibraryResult<ScriptConfig> {
        let config_path = self.script_dir(script_id)?.join(STORY_CONFIG_FILE);
        if !config_path.is_file() {
            return Err(LibraryError::not_found("Config not found"));
        }
        let mut config: ScriptConfig = read_yaml(&config_path)?;
        config.id = Some(script_id.to_string());
        Ok(config)
    }

    /// Creates a new script directory with its folders, an empty intro chapter
    /// and `story_config.yaml`. Returns the new script id. Nothing is rolled
    /// back if a step fails halfway.
    pub fn create_script(&self, request: &CreateScriptRequest) -> LibraryResult<String> {
        let script_id = paths::script_segment(&request.name)?;
        let intro = paths::relative_path(&request.intro_chapter)?;

        let script_dir = self.root.join(script_id);
        if script_dir.exists() {
            return Err(LibraryError::Conflict(
                "Script with this name already exists".to_string(),
            ));
        }

        fs::create_dir_all(&script_dir)
            .with_context(|| format!("Failed to create {}", script_dir.display()))?;
        for name in paths::NEW_SCRIPT_DIRS {
            let dir = script_dir.join(name);
            fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut intro_file = script_dir.join("Charpters").join(intro);
        if intro_file.extension().is_none() {
            intro_file.set_extension("yaml");
        }
        if let Some(parent) = intro_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        write_yaml(&intro_file, &Chapter::default())?;

        let config = ScriptConfig {
            id: None,
            script_name: request.name.clone(),
            intro_charpter: request.intro_chapter.clone(),
            description: Some(request.description.clone()),
            script_settings: Some(ScriptSettings {
                user_name: Some(request.user_name.clone()),
                user_subtitle: Some(request.user_subtitle.clone()),
            }),
        };
        write_yaml(&script_dir.join(STORY_CONFIG_FILE), &config)?;

        info!("Created script {}", script_id);
        Ok(script_id.to_string())
    }
}
