use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::path::PathBuf;
use thiserror::Error;

// --- Scripts ---

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct ScriptSettings {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_subtitle: Option<String>,
}

/// Contents of `story_config.yaml`. `id` is never stored on disk, it is the
/// directory name and gets filled in when the config is read.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScriptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub script_name: String,
    pub intro_charpter: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub script_settings: Option<ScriptSettings>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateScriptRequest {
    pub name: String,
    pub description: String,
    pub user_name: String,
    pub user_subtitle: String,
    pub intro_chapter: String,
}

// --- Chapters ---

#[derive(Debug, Error)]
#[error("event field `{field}` must be {expected}")]
pub struct EventFieldError {
    pub field: &'static str,
    pub expected: &'static str,
}

/// A single narrative event. The recognised fields (`type`, `duration`,
/// `condition`, `isFinal`) are type checked, every other key is kept as is and
/// in its original order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct Event {
    fields: Mapping,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        let mut fields = Mapping::new();
        fields.insert("type".into(), kind.into());
        Self { fields }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// Seconds the event lasts, 0 when unset.
    pub fn duration(&self) -> f64 {
        self.fields.get("duration").and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn condition(&self) -> Option<&str> {
        self.fields.get("condition").and_then(Value::as_str)
    }

    pub fn is_final(&self) -> Option<bool> {
        self.fields.get("isFinal").and_then(Value::as_bool)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }
}

impl TryFrom<Mapping> for Event {
    type Error = EventFieldError;

    fn try_from(fields: Mapping) -> Result<Self, Self::Error> {
        let check = |field: &'static str, expected: &'static str, ok: fn(&Value) -> bool| {
            match fields.get(field) {
                Some(v) if !v.is_null() && !ok(v) => Err(EventFieldError { field, expected }),
                _ => Ok(()),
            }
        };
        check("type", "a string", Value::is_string)?;
        check("duration", "a number", Value::is_number)?;
        check("condition", "a string", Value::is_string)?;
        check("isFinal", "a boolean", Value::is_bool)?;
        Ok(Self { fields })
    }
}

impl From<Event> for Mapping {
    fn from(event: Event) -> Self {
        event.fields
    }
}

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("chapter has no `events` list")]
    MissingEvents,
    #[error("invalid `events`: {0}")]
    Events(#[from] serde_yaml_ng::Error),
}

/// A chapter document. Keys next to `events` are preserved, and `events`
/// keeps its position among them when written back.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct Chapter {
    pub events: Vec<Event>,
    pub extra: Mapping,
    events_at: usize,
}

impl Chapter {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }
}

impl TryFrom<Mapping> for Chapter {
    type Error = ChapterError;

    fn try_from(fields: Mapping) -> Result<Self, Self::Error> {
        let mut events = None;
        let mut events_at = 0;
        let mut extra = Mapping::with_capacity(fields.len());
        for (key, value) in fields {
            if key.as_str() == Some("events") {
                events_at = extra.len();
                events = Some(serde_yaml_ng::from_value::<Vec<Event>>(value)?);
            } else {
                extra.insert(key, value);
            }
        }
        Ok(Self {
            events: events.ok_or(ChapterError::MissingEvents)?,
            extra,
            events_at,
        })
    }
}

impl From<Chapter> for Mapping {
    fn from(chapter: Chapter) -> Self {
        let events: Vec<Value> = chapter
            .events
            .into_iter()
            .map(|e| Value::Mapping(e.into()))
            .collect();
        let mut events = Some(Value::Sequence(events));
        let mut fields = Mapping::with_capacity(chapter.extra.len() + 1);
        for (i, (key, value)) in chapter.extra.into_iter().enumerate() {
            if i == chapter.events_at {
                if let Some(events) = events.take() {
                    fields.insert("events".into(), events);
                }
            }
            fields.insert(key, value);
        }
        if let Some(events) = events {
            fields.insert("events".into(), events);
        }
        fields
    }
}

// --- Characters and assets ---

/// The `[role]` table of a character file plus the injected `_path` and `id`.
pub type Character = toml::Table;

pub const DEFAULT_ASSET_CATEGORIES: [&str; 5] = ["Backgrounds", "Musics", "Sounds", "Effects", "Other"];
pub const FALLBACK_ASSET_CATEGORY: &str = "Other";

/// Category name to asset paths, default categories first.
pub type AssetIndex = IndexMap<String, Vec<String>>;

pub fn empty_asset_index() -> AssetIndex {
    DEFAULT_ASSET_CATEGORIES
        .iter()
        .map(|c| (c.to_string(), Vec::new()))
        .collect()
}

// --- Listings ---

/// An item left out of a listing because it could not be read.
#[derive(Serialize, Clone, Debug)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Listing<T> {
    pub fn skip(&mut self, path: PathBuf, reason: impl std::fmt::Display) {
        let reason = reason.to_string();
        log::warn!("Skipping {}: {}", path.display(), reason);
        self.skipped.push(Skipped { path, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_event_accessors_and_defaults() -> Result<()> {
        let event: Event = serde_yaml_ng::from_str("type: dialogue\nspeaker: Alice\ntext: こんにちは\n")?;
        assert_eq!(event.kind(), Some("dialogue"));
        assert_eq!(event.duration(), 0.0);
        assert_eq!(event.condition(), None);
        assert_eq!(event.is_final(), None);
        assert_eq!(event.get("speaker").and_then(Value::as_str), Some("Alice"));

        let event: Event = serde_yaml_ng::from_str("type: wait\nduration: 1.5\nisFinal: true\ncondition: met_bob\n")?;
        assert_eq!(event.duration(), 1.5);
        assert_eq!(event.is_final(), Some(true));
        assert_eq!(event.condition(), Some("met_bob"));
        Ok(())
    }

    #[test]
    fn test_event_rejects_wrong_field_types() {
        assert!(serde_yaml_ng::from_str::<Event>("type: wait\nduration: soon\n").is_err());
        assert!(serde_yaml_ng::from_str::<Event>("type: [a]\n").is_err());
        assert!(serde_yaml_ng::from_str::<Event>("isFinal: maybe\n").is_err());
        assert!(serde_yaml_ng::from_str::<Event>("condition: null\nisFinal: null\n").is_ok());
    }

    #[test]
    fn test_chapter_keeps_key_order_and_extra_keys() -> Result<()> {
        let src = "events:\n- zeta: 1\n  type: dialogue\n  alpha: 2\ntitle: Prologue\n";
        let chapter: Chapter = serde_yaml_ng::from_str(src)?;
        assert_eq!(chapter.extra.get("title").and_then(Value::as_str), Some("Prologue"));

        let keys: Vec<_> = chapter.events[0]
            .fields()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(keys, ["zeta", "type", "alpha"]);

        assert_eq!(serde_yaml_ng::to_string(&chapter)?, src);
        Ok(())
    }

    #[test]
    fn test_chapter_keeps_position_of_events() -> Result<()> {
        let chapter: Chapter = serde_json::from_str(
            r#"{"title":"Prologue","events":[{"type":"end"}],"music":"rain.ogg"}"#,
        )?;
        assert_eq!(chapter.events.len(), 1);
        assert_eq!(
            serde_yaml_ng::to_string(&chapter)?,
            "title: Prologue\nevents:\n- type: end\nmusic: rain.ogg\n"
        );

        let mut appended = Chapter::new(vec![Event::new("end")]);
        appended.extra.insert("title".into(), "Epilogue".into());
        assert_eq!(
            serde_yaml_ng::to_string(&appended)?,
            "events:\n- type: end\ntitle: Epilogue\n"
        );
        Ok(())
    }

    #[test]
    fn test_chapter_requires_events() {
        assert!(serde_yaml_ng::from_str::<Chapter>("title: Prologue\n").is_err());
        assert!(serde_yaml_ng::from_str::<Chapter>("events: nope\n").is_err());
        assert!(serde_yaml_ng::from_str::<Chapter>("events:\n- duration: soon\n").is_err());
    }

    #[test]
    fn test_chapter_from_json_body() -> Result<()> {
        let chapter: Chapter = serde_json::from_str(
            r#"{"events":[{"type":"choice","options":["left","right"],"duration":2}]}"#,
        )?;
        assert_eq!(chapter.events.len(), 1);
        assert_eq!(chapter.events[0].kind(), Some("choice"));
        assert_eq!(chapter.events[0].duration(), 2.0);
        Ok(())
    }

    #[test]
    fn test_script_config_serializes_in_authored_order() -> Result<()> {
        let config = ScriptConfig {
            id: None,
            script_name: "Moonlight".to_string(),
            intro_charpter: "intro".to_string(),
            description: Some("月光".to_string()),
            script_settings: Some(ScriptSettings {
                user_name: Some("Player".to_string()),
                user_subtitle: Some("Hero".to_string()),
            }),
        };
        let yaml = serde_yaml_ng::to_string(&config)?;
        assert_eq!(
            yaml,
            "script_name: Moonlight\nintro_charpter: intro\ndescription: 月光\nscript_settings:\n  user_name: Player\n  user_subtitle: Hero\n"
        );
        Ok(())
    }

    #[test]
    fn test_empty_asset_index() {
        let index = empty_asset_index();
        let keys: Vec<_> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, DEFAULT_ASSET_CATEGORIES);
        assert!(index.values().all(Vec::is_empty));
    }
}
