//! Wire types for the command/event protocol: one `{type, payload?}` JSON
//! object per line, in both directions.
use serde::{Deserialize, Serialize};

use crate::effects::ParamMap;
use crate::grid::{PanelState, TopologyMode};
use crate::preset::EffectPreset;

/// A command received from a subscriber.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    RunEffect { payload: RunEffectPayload },
    StopEffect,
    SetTopology { payload: SetTopologyPayload },
    AddPreset { payload: AddPresetPayload },
    SavePreset { payload: SavePresetPayload },
    UpdatePreset { payload: serde_json::Value },
    DeletePreset { payload: DeletePresetPayload },
    ListPresets,
}

/// Either an effect named directly with overrides, or a reference to a
/// persisted preset whose effect/topology/params are loaded from the store.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RunEffectPayload {
    ByName {
        #[serde(rename = "effectName")]
        effect_name: String,
        #[serde(default)]
        params: ParamMap,
    },
    ByPreset {
        #[serde(rename = "presetId")]
        preset_id: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct SetTopologyPayload {
    pub mode: TopologyMode,
}

#[derive(Debug, Deserialize)]
pub struct AddPresetPayload {
    pub name: String,
    pub preset: crate::gradient::ColorPreset,
}

#[derive(Debug, Deserialize)]
pub struct SavePresetPayload {
    pub id: String,
    pub name: String,
    pub effect: String,
    pub topology: TopologyMode,
    #[serde(default)]
    pub params: ParamMap,
}

#[derive(Debug, Deserialize)]
pub struct DeletePresetPayload {
    pub id: String,
}

/// An event sent out to a subscriber.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Connected { payload: ConnectedPayload },
    StateUpdate { payload: StateUpdatePayload },
    Error { payload: ErrorPayload },
    PresetSaved { payload: EffectPreset },
    PresetUpdated { payload: EffectPreset },
    PresetDeleted { payload: DeletePresetPayload },
    PresetsList { payload: Vec<EffectPreset> },
}

#[derive(Debug, Serialize)]
pub struct ConnectedPayload {
    pub columns: usize,
    pub rows_per_column: usize,
    pub topology: TopologyMode,
    pub current_effect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StateUpdatePayload {
    pub panels: Vec<PanelState>,
    #[serde(rename = "currentEffect")]
    pub current_effect: Option<String>,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

impl From<&crate::error::EngineError> for ErrorPayload {
    fn from(e: &crate::error::EngineError) -> Self {
        ErrorPayload {
            kind: e.kind().to_string(),
            message: e.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_effect_by_name_parses() {
        let raw = r#"{"type":"runEffect","payload":{"effectName":"solid","params":{"brightness":1.0}}}"#;
        let cmd: Command = serde_json::from_str(raw).unwrap();
        match cmd {
            Command::RunEffect {
                payload: RunEffectPayload::ByName { effect_name, params },
            } => {
                assert_eq!(effect_name, "solid");
                assert!(params.contains_key("brightness"));
            }
            _ => panic!("expected RunEffect::ByName"),
        }
    }

    #[test]
    fn run_effect_by_preset_parses() {
        let raw = r#"{"type":"runEffect","payload":{"presetId":"sequential-ww"}}"#;
        let cmd: Command = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            cmd,
            Command::RunEffect {
                payload: RunEffectPayload::ByPreset { .. }
            }
        ));
    }

    #[test]
    fn stop_effect_has_no_payload() {
        let raw = r#"{"type":"stopEffect"}"#;
        let cmd: Command = serde_json::from_str(raw).unwrap();
        assert!(matches!(cmd, Command::StopEffect));
    }
}
