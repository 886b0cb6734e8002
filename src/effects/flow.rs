use std::f32::consts::PI;

use crate::color::RgbcctColor;
use crate::gradient::{ColorSpace, Gradient, GradientStop};
use crate::grid::{PanelState, TopologyMode};

use super::{param_f32, param_str, EffectContext, EffectKind, ParamMap};

/// A gradient scrolled continuously across the grid. `mode=chase`
/// restricts the bright region to a window of `chaseLength` panels;
/// `waveHeight` layers a brightness sine wave on top.
pub struct FlowEffect {
    start_time_ms: f64,
}

impl FlowEffect {
    pub fn new() -> Self {
        FlowEffect { start_time_ms: 0.0 }
    }

    pub fn name(&self) -> &'static str {
        "flow"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::Continuous
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("colorPreset".into(), super::ParamValue::String("rainbow".into()));
        p.insert("speed".into(), super::ParamValue::Number(0.2));
        p.insert("brightness".into(), super::ParamValue::Number(1.0));
        p.insert("mode".into(), super::ParamValue::String("full".into()));
        p.insert("chaseLength".into(), super::ParamValue::Number(3.0));
        p.insert("waveHeight".into(), super::ParamValue::Number(0.0));
        p.insert("scale".into(), super::ParamValue::Number(1.0));
        p
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        self.start_time_ms = ctx.elapsed_time_ms;
    }

    fn gradient(&self, ctx: &EffectContext) -> Gradient {
        let preset_name = param_str(ctx.params, "colorPreset", "rainbow");
        match ctx.color_manager.get_preset(preset_name) {
            Some(preset) => preset.as_gradient(),
            None => default_rainbow_gradient(),
        }
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let gradient = self.gradient(ctx);
        let speed = param_f32(ctx.params, "speed", 0.2);
        let brightness_param = param_f32(ctx.params, "brightness", 1.0);
        let mode = param_str(ctx.params, "mode", "full");
        let chase_len = param_f32(ctx.params, "chaseLength", 3.0);
        let wave_height = param_f32(ctx.params, "waveHeight", 0.0);
        let scale = param_f32(ctx.params, "scale", 1.0);

        let elapsed = (ctx.elapsed_time_ms - self.start_time_ms) as f32;
        let time_offset = wrap01(elapsed * speed / 1000.0);

        let n = ctx.grid.len();
        let mut states = vec![PanelState::new(RgbcctColor::BLACK, 0.0); n];

        if ctx.grid.mode() == TopologyMode::Singular {
            let color = gradient.sample(time_offset);
            let state = PanelState::new(color, brightness_param);
            for s in states.iter_mut() {
                *s = state;
            }
            return states;
        }

        for sequence in ctx.grid.sequences() {
            let len = sequence.len().max(1) as f32;
            for (k, &panel_id) in sequence.iter().enumerate() {
                let normalized = k as f32 / len;
                let gradient_pos = wrap01(normalized * scale + time_offset);
                let color = gradient.sample(gradient_pos);

                let mut brightness = brightness_param;
                if mode == "chase" {
                    let d = normalized.min(1.0 - normalized);
                    let falloff = chase_len / len;
                    brightness = if falloff > 0.0 && d < falloff {
                        brightness * (1.0 - d / falloff)
                    } else {
                        0.0
                    };
                }
                if wave_height > 0.0 {
                    let wave = (4.0 * PI * normalized + 2.0 * PI * time_offset).sin();
                    brightness = (brightness + brightness * wave_height * wave).clamp(0.0, 1.0);
                }

                if let Some(state) = states.get_mut(panel_id) {
                    *state = PanelState::new(color, brightness);
                }
            }
        }

        states
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        false
    }

    pub fn progress(&self) -> f32 {
        0.0
    }
}

fn wrap01(v: f32) -> f32 {
    v.rem_euclid(1.0)
}

fn default_rainbow_gradient() -> Gradient {
    Gradient::new(
        vec![
            GradientStop {
                position: 0.0,
                color: RgbcctColor::new(255, 0, 0, 0, 0),
            },
            GradientStop {
                position: 1.0,
                color: RgbcctColor::new(0, 0, 255, 0, 0),
            },
        ],
        ColorSpace::Rgb,
    )
}
