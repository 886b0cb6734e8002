//! The six effect state machines and the shared protocol
//! (`initialize`/`compute`/`cleanup`/`is_done`/`progress`) the
//! [`crate::runner::EffectRunner`] drives them through.
mod blackout;
mod flow;
mod sequential_fade;
mod solid;
mod static_color;
mod strobe;

pub use blackout::BlackoutEffect;
pub use flow::FlowEffect;
pub use sequential_fade::SequentialFadeEffect;
pub use solid::SolidEffect;
pub use static_color::StaticEffect;
pub use strobe::StrobeEffect;

use std::collections::HashMap;

use crate::color::RgbcctColor;
use crate::gradient::ColorManager;
use crate::grid::{PanelGrid, PanelState};

/// Whether an effect terminates on its own (`OneShot`) or runs until
/// superseded or stopped (`Continuous`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Continuous,
    OneShot,
}

/// A typed effect-parameter value, as carried in the wire protocol and in
/// persisted effect presets.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    String(String),
    Color(RgbcctColor),
    ColorList(Vec<RgbcctColor>),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<RgbcctColor> {
        match self {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_color_list(&self) -> Option<&[RgbcctColor]> {
        match self {
            ParamValue::ColorList(c) => Some(c),
            _ => None,
        }
    }
}

pub type ParamMap = HashMap<String, ParamValue>;

/// Read a numeric param by name, falling back to `default` if absent or
/// the wrong type. Every effect's param accessors go through these
/// helpers so a malformed or missing value degrades gracefully rather
/// than panicking mid-tick.
pub fn param_f64(params: &ParamMap, key: &str, default: f64) -> f64 {
    params.get(key).and_then(ParamValue::as_f64).unwrap_or(default)
}

pub fn param_f32(params: &ParamMap, key: &str, default: f32) -> f32 {
    param_f64(params, key, default as f64) as f32
}

pub fn param_bool(params: &ParamMap, key: &str, default: bool) -> bool {
    params.get(key).and_then(ParamValue::as_bool).unwrap_or(default)
}

pub fn param_str<'a>(params: &'a ParamMap, key: &str, default: &'a str) -> &'a str {
    params.get(key).and_then(ParamValue::as_str).unwrap_or(default)
}

pub fn param_color(params: &ParamMap, key: &str, default: RgbcctColor) -> RgbcctColor {
    params.get(key).and_then(ParamValue::as_color).unwrap_or(default)
}

/// Merge caller-supplied `overrides` onto an effect's `defaults`,
/// producing the effective param map the runner hands to `initialize`.
pub fn merge_params(defaults: &ParamMap, overrides: &ParamMap) -> ParamMap {
    let mut merged = defaults.clone();
    for (k, v) in overrides {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Everything an effect needs to compute one frame: timing, read-only
/// access to the grid and color library, and its own effective params.
/// Effects never write through `grid`; `compute` returns a fresh
/// `Vec<PanelState>` that the engine applies afterward.
pub struct EffectContext<'a> {
    pub delta_time_ms: f64,
    pub elapsed_time_ms: f64,
    pub grid: &'a PanelGrid,
    pub color_manager: &'a ColorManager,
    pub params: &'a ParamMap,
}

/// Quadratic ease-out: `t * (2 - t)`.
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * (2.0 - t)
}

/// Quadratic ease-in-out.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Cubic ease-out: `1 - (1 - t)^3`.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Resolve the `colorPreset` param into a single representative color,
/// the way SolidColor/SequentialFade/Strobe all do: solid presets use
/// their color, gradients are sampled at their midpoint, and a missing
/// preset falls back to [`RgbcctColor::WHITE`].
pub fn resolve_target_color(color_manager: &ColorManager, preset_name: &str) -> RgbcctColor {
    color_manager
        .get_preset(preset_name)
        .map(|p| p.representative_color())
        .unwrap_or(RgbcctColor::WHITE)
}

/// Closed sum type over the six effect kinds. Each variant owns its own
/// running state; the engine never needs to know which effect is active
/// beyond what this enum's methods expose.
pub enum Effect {
    Solid(SolidEffect),
    SequentialFade(SequentialFadeEffect),
    Flow(FlowEffect),
    Strobe(StrobeEffect),
    Blackout(BlackoutEffect),
    Static(StaticEffect),
}

macro_rules! dispatch {
    ($self:ident, $method:ident $(, $arg:expr )*) => {
        match $self {
            Effect::Solid(e) => e.$method($($arg),*),
            Effect::SequentialFade(e) => e.$method($($arg),*),
            Effect::Flow(e) => e.$method($($arg),*),
            Effect::Strobe(e) => e.$method($($arg),*),
            Effect::Blackout(e) => e.$method($($arg),*),
            Effect::Static(e) => e.$method($($arg),*),
        }
    };
}

impl Effect {
    pub fn name(&self) -> &'static str {
        dispatch!(self, name)
    }

    pub fn kind(&self) -> EffectKind {
        dispatch!(self, kind)
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        dispatch!(self, initialize, ctx)
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        dispatch!(self, compute, ctx)
    }

    pub fn cleanup(&mut self) {
        dispatch!(self, cleanup)
    }

    pub fn is_done(&self) -> bool {
        dispatch!(self, is_done)
    }

    pub fn progress(&self) -> f32 {
        dispatch!(self, progress)
    }
}

/// Construct the named effect with its built-in defaults. Returns `None`
/// for an unrecognized name (the caller turns that into
/// `EngineError::NotFound`).
pub fn effect_defaults(name: &str) -> Option<ParamMap> {
    match name {
        "solid" => Some(SolidEffect::new().defaults()),
        "sequential_fade" => Some(SequentialFadeEffect::new().defaults()),
        "flow" => Some(FlowEffect::new().defaults()),
        "strobe" => Some(StrobeEffect::new().defaults()),
        "blackout" => Some(BlackoutEffect::new().defaults()),
        "static" => Some(StaticEffect::new().defaults()),
        _ => None,
    }
}

/// Construct a fresh, uninitialized [`Effect`] by name.
pub fn make_effect(name: &str) -> Option<Effect> {
    match name {
        "solid" => Some(Effect::Solid(SolidEffect::new())),
        "sequential_fade" => Some(Effect::SequentialFade(SequentialFadeEffect::new())),
        "flow" => Some(Effect::Flow(FlowEffect::new())),
        "strobe" => Some(Effect::Strobe(StrobeEffect::new())),
        "blackout" => Some(Effect::Blackout(BlackoutEffect::new())),
        "static" => Some(Effect::Static(StaticEffect::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_out_quad_boundary_values() {
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
    }

    #[test]
    fn ease_out_cubic_boundary_values() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
    }

    #[test]
    fn unknown_effect_name_yields_none() {
        assert!(make_effect("glitter").is_none());
        assert!(effect_defaults("glitter").is_none());
    }

    #[test]
    fn merge_params_overrides_defaults() {
        let mut defaults = ParamMap::new();
        defaults.insert("brightness".into(), ParamValue::Number(1.0));
        let mut overrides = ParamMap::new();
        overrides.insert("brightness".into(), ParamValue::Number(0.5));
        let merged = merge_params(&defaults, &overrides);
        assert_eq!(param_f64(&merged, "brightness", 0.0), 0.5);
    }
}
