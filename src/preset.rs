//! On-disk JSON store of named effect presets: sanitized ids, protected
//! defaults, atomic persistence, and merge-patch updates.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::effects::{ParamMap, ParamValue};
use crate::error::{EngineError, EngineResult};
use crate::grid::TopologyMode;

const STORE_VERSION: &str = "1.0";

/// A persisted effect configuration: an effect name, topology, and the
/// params it was saved with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectPreset {
    pub id: String,
    pub name: String,
    pub effect: String,
    pub topology: TopologyMode,
    pub params: ParamMap,
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
    #[serde(rename = "isProtected")]
    pub is_protected: bool,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: String,
    presets: Vec<EffectPreset>,
}

/// Owns the in-memory preset map and the on-disk file. Every mutating
/// operation re-persists the full set before returning.
pub struct PresetManager {
    path: PathBuf,
    presets: HashMap<String, EffectPreset>,
}

impl PresetManager {
    /// Load from `path`, seeding and saving the protected defaults if the
    /// file is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        let mut manager = PresetManager {
            path,
            presets: HashMap::new(),
        };

        match fs::read_to_string(&manager.path) {
            Ok(contents) => match serde_json::from_str::<StoreFile>(&contents) {
                Ok(store) => {
                    for preset in store.presets {
                        manager.presets.insert(preset.id.clone(), preset);
                    }
                }
                Err(e) => {
                    log::warn!("preset store at {:?} is malformed ({e}); reseeding defaults", manager.path);
                    manager.seed_defaults();
                    manager.persist()?;
                }
            },
            Err(e) => {
                log::info!("no preset store at {:?} ({e}); seeding defaults", manager.path);
                manager.seed_defaults();
                manager.persist()?;
            }
        }

        Ok(manager)
    }

    fn seed_defaults(&mut self) {
        for preset in seeded_presets() {
            self.presets.insert(preset.id.clone(), preset);
        }
    }

    pub fn get(&self, id: &str) -> Option<&EffectPreset> {
        self.presets.get(id)
    }

    pub fn get_all(&self) -> Vec<&EffectPreset> {
        self.presets.values().collect()
    }

    pub fn create(
        &mut self,
        raw_id: &str,
        name: &str,
        effect: &str,
        topology: TopologyMode,
        params: ParamMap,
    ) -> EngineResult<EffectPreset> {
        let id = sanitize_id(raw_id);
        if id.is_empty() {
            return Err(EngineError::InvalidParam(format!("'{raw_id}' sanitizes to an empty id")));
        }
        if self.presets.contains_key(&id) {
            return Err(EngineError::Conflict(format!("preset id '{id}' already exists")));
        }

        let now = now_secs();
        let preset = EffectPreset {
            id: id.clone(),
            name: name.to_string(),
            effect: effect.to_string(),
            topology,
            params,
            created_at: now,
            updated_at: now,
            is_protected: false,
        };
        self.presets.insert(id, preset.clone());
        self.persist()?;
        Ok(preset)
    }

    /// Apply `patch` as a JSON merge patch over the preset's serialized
    /// form, re-validate, stamp `updatedAt`, and persist. `id`,
    /// `isProtected`, and `createdAt` in the patch are ignored.
    pub fn update(&mut self, id: &str, mut patch: serde_json::Value) -> EngineResult<EffectPreset> {
        let existing = self
            .presets
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("preset '{id}' not found")))?;
        if existing.is_protected {
            return Err(EngineError::Protected(format!("preset '{id}' is protected")));
        }

        if let Some(obj) = patch.as_object_mut() {
            obj.remove("id");
            obj.remove("isProtected");
            obj.remove("createdAt");
        }

        let mut value = serde_json::to_value(existing)?;
        json_patch::merge(&mut value, &patch);
        let mut updated: EffectPreset = serde_json::from_value(value)?;
        updated.updated_at = now_secs();

        self.presets.insert(id.to_string(), updated.clone());
        self.persist()?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> EngineResult<()> {
        let existing = self
            .presets
            .get(id)
            .ok_or_else(|| EngineError::NotFound(format!("preset '{id}' not found")))?;
        if existing.is_protected {
            return Err(EngineError::Protected(format!("preset '{id}' is protected")));
        }
        self.presets.remove(id);
        self.persist()
    }

    /// Write the full set as pretty JSON, via a temp file renamed into
    /// place so readers never observe a partial write.
    fn persist(&self) -> EngineResult<()> {
        let store = StoreFile {
            version: STORE_VERSION.to_string(),
            presets: self.presets.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&store)?;

        let tmp_path = tmp_path_for(&self.path);
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Lowercase, collapse whitespace/invalid chars into single hyphens, trim
/// leading/trailing hyphens. Idempotent: `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize_id(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut last_was_dash = false;
    for c in lower.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn num(v: f64) -> ParamValue {
    ParamValue::Number(v)
}

fn string(v: &str) -> ParamValue {
    ParamValue::String(v.to_string())
}

fn params(entries: &[(&str, ParamValue)]) -> ParamMap {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn seeded_presets() -> Vec<EffectPreset> {
    let now = now_secs();
    let preset = |id: &str, name: &str, effect: &str, topology: TopologyMode, params: ParamMap| EffectPreset {
        id: id.to_string(),
        name: name.to_string(),
        effect: effect.to_string(),
        topology,
        params,
        created_at: now,
        updated_at: now,
        is_protected: true,
    };

    vec![
        preset(
            "sequential-ww",
            "Sequential Warm White",
            "sequential_fade",
            TopologyMode::Linear,
            params(&[
                ("colorPreset", string("warm")),
                ("brightness", num(1.0)),
                ("delayBetweenPanels", num(200.0)),
                ("fadeDuration", num(1050.0)),
            ]),
        ),
        preset(
            "sequential-cw",
            "Sequential Cool White",
            "sequential_fade",
            TopologyMode::Linear,
            params(&[
                ("colorPreset", string("white")),
                ("brightness", num(1.0)),
                ("delayBetweenPanels", num(200.0)),
                ("fadeDuration", num(1050.0)),
            ]),
        ),
        preset(
            "flow-slow-rainbow",
            "Slow Rainbow Flow",
            "flow",
            TopologyMode::Linear,
            params(&[
                ("colorPreset", string("rainbow")),
                ("brightness", num(1.0)),
                ("speed", num(0.1)),
                ("scale", num(0.15)),
            ]),
        ),
        preset(
            "strobe-10hz",
            "10Hz Strobe",
            "strobe",
            TopologyMode::Circular,
            params(&[
                ("colorPreset", string("white")),
                ("brightness", num(1.0)),
                ("frequency", num(10.0)),
            ]),
        ),
        preset(
            "blackout-quick",
            "Quick Blackout",
            "blackout",
            TopologyMode::Circular,
            params(&[("brightness", num(1.0)), ("transitionDuration", num(300.0))]),
        ),
        preset(
            "blackout-instant",
            "Instant Blackout",
            "blackout",
            TopologyMode::Circular,
            params(&[("brightness", num(1.0)), ("transitionDuration", num(0.0))]),
        ),
        preset(
            "flow-quick-chase",
            "Quick Chase",
            "flow",
            TopologyMode::Linear,
            params(&[
                ("colorPreset", string("breathe")),
                ("brightness", num(1.0)),
                ("speed", num(0.8)),
                ("scale", num(0.4)),
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_in(dir: &tempfile::TempDir) -> PresetManager {
        PresetManager::load(dir.path().join("presets.json")).unwrap()
    }

    #[test]
    fn missing_file_seeds_seven_protected_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);
        assert_eq!(manager.get_all().len(), 7);
        assert!(manager.get("sequential-ww").unwrap().is_protected);
        assert!(dir.path().join("presets.json").exists());
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize_id("My Preset!!"), "my-preset");
        assert_eq!(sanitize_id("  leading and trailing  "), "leading-and-trailing");
        assert_eq!(sanitize_id("a---b"), "a-b");
        assert_eq!(sanitize_id(&sanitize_id("My Preset!!")), sanitize_id("My Preset!!"));
    }

    #[test]
    fn create_sanitizes_id_and_rejects_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_in(&dir);
        let preset = manager
            .create("My Preset!!", "x", "flow", TopologyMode::Linear, ParamMap::new())
            .unwrap();
        assert_eq!(preset.id, "my-preset");

        let err = manager
            .create("my preset", "y", "flow", TopologyMode::Linear, ParamMap::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn protected_preset_rejects_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_in(&dir);
        let patch = serde_json::json!({"name": "New Name"});
        assert!(matches!(
            manager.update("sequential-ww", patch).unwrap_err(),
            EngineError::Protected(_)
        ));
        assert!(matches!(manager.delete("sequential-ww").unwrap_err(), EngineError::Protected(_)));
    }

    #[test]
    fn update_merges_patch_and_stamps_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_in(&dir);
        let created = manager
            .create("custom", "Custom", "solid", TopologyMode::Linear, ParamMap::new())
            .unwrap();

        let patch = serde_json::json!({"name": "Renamed"});
        let updated = manager.update(&created.id, patch).unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.effect, "solid");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        {
            let mut manager = PresetManager::load(&path).unwrap();
            manager
                .create("custom", "Custom", "solid", TopologyMode::Linear, ParamMap::new())
                .unwrap();
        }
        let reloaded = PresetManager::load(&path).unwrap();
        let preset = reloaded.get("custom").expect("preset should survive reload");
        assert_eq!(preset.name, "Custom");
    }
}
