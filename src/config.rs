//! Layered startup configuration: a JSON file with hardcoded defaults for
//! every field, then `LUMENFORGE_<SECTION>_<FIELD>` environment overrides.
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::TopologyMode;
use crate::output::ArtNetConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub target_fps: u32,
    pub columns: usize,
    pub rows_per_column: usize,
    pub initial_topology: TopologyMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            target_fps: 60,
            columns: 2,
            rows_per_column: 7,
            initial_topology: TopologyMode::Circular,
        }
    }
}

/// Top-level configuration, loaded once at startup. Every field has a
/// hardcoded default so a missing or partial config file still produces a
/// runnable engine with Art-Net disabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Raw `{name: ColorPreset}` map, handed to `ColorManager::load_presets_from_config`.
    #[serde(default = "default_presets")]
    pub presets: serde_json::Value,
    #[serde(default)]
    pub artnet: ArtNetConfig,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_preset_store_path")]
    pub preset_store_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            presets: default_presets(),
            artnet: ArtNetConfig::default(),
            bind_addr: default_bind_addr(),
            preset_store_path: default_preset_store_path(),
        }
    }
}

fn default_presets() -> serde_json::Value {
    serde_json::json!({})
}

fn default_bind_addr() -> String {
    "0.0.0.0:7890".to_string()
}

fn default_preset_store_path() -> String {
    "presets.json".to_string()
}

impl Config {
    /// Load from `path`, falling back to all-defaults if it's missing or
    /// malformed, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Config {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("config file at {path:?} is malformed ({e}); using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                log::info!("no config file at {path:?} ({e}); using defaults");
                Config::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        override_field("LUMENFORGE_ENGINE_TARGET_FPS", &mut self.engine.target_fps);
        override_field("LUMENFORGE_ENGINE_COLUMNS", &mut self.engine.columns);
        override_field("LUMENFORGE_ENGINE_ROWS_PER_COLUMN", &mut self.engine.rows_per_column);
        override_topology("LUMENFORGE_ENGINE_INITIAL_TOPOLOGY", &mut self.engine.initial_topology);

        override_field("LUMENFORGE_ARTNET_ENABLED", &mut self.artnet.enabled);
        override_string("LUMENFORGE_ARTNET_HOST", &mut self.artnet.host);
        override_field("LUMENFORGE_ARTNET_PORT", &mut self.artnet.port);
        override_field("LUMENFORGE_ARTNET_NET", &mut self.artnet.net);
        override_field("LUMENFORGE_ARTNET_SUBNET", &mut self.artnet.subnet);
        override_field("LUMENFORGE_ARTNET_UNIVERSE", &mut self.artnet.universe);
        override_field("LUMENFORGE_ARTNET_START_CHANNEL", &mut self.artnet.start_channel);
        override_field("LUMENFORGE_ARTNET_CHANNELS_PER_PANEL", &mut self.artnet.channels_per_panel);
        override_field("LUMENFORGE_ARTNET_REFRESH_RATE", &mut self.artnet.refresh_rate);

        override_string("LUMENFORGE_SERVER_BIND_ADDR", &mut self.bind_addr);
        override_string("LUMENFORGE_PRESETS_STORE_PATH", &mut self.preset_store_path);
    }
}

/// Parse an env var of type `T` over `field`, logging and leaving `field`
/// untouched on a missing var or parse failure.
fn override_field<T: FromStr>(var: &str, field: &mut T)
where
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *field = value,
        Err(e) => log::warn!("ignoring {var}={raw:?}: {e}"),
    }
}

fn override_string(var: &str, field: &mut String) {
    if let Ok(raw) = std::env::var(var) {
        *field = raw;
    }
}

fn override_topology(var: &str, field: &mut TopologyMode) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.as_str() {
        "circular" => *field = TopologyMode::Circular,
        "linear" => *field = TopologyMode::Linear,
        "singular" => *field = TopologyMode::Singular,
        other => log::warn!("ignoring {var}={other:?}: expected circular|linear|singular"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // std::env::set_var mutates global process state; serialize the tests
    // that touch it so they don't race each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_file_yields_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.json"));
        assert_eq!(config.engine.columns, 2);
        assert_eq!(config.engine.rows_per_column, 7);
        assert!(!config.artnet.enabled);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.engine.target_fps, 60);
    }

    #[test]
    fn env_override_applies_and_survives_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("LUMENFORGE_ENGINE_TARGET_FPS", "120");
        std::env::set_var("LUMENFORGE_ARTNET_HOST", "10.0.0.5");
        std::env::set_var("LUMENFORGE_ENGINE_COLUMNS", "not-a-number");

        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.json"));

        assert_eq!(config.engine.target_fps, 120);
        assert_eq!(config.artnet.host, "10.0.0.5");
        assert_eq!(config.engine.columns, 2, "malformed override should be ignored");

        std::env::remove_var("LUMENFORGE_ENGINE_TARGET_FPS");
        std::env::remove_var("LUMENFORGE_ARTNET_HOST");
        std::env::remove_var("LUMENFORGE_ENGINE_COLUMNS");
    }
}
