use crate::grid::PanelState;

use super::{param_f32, param_str, resolve_target_color, EffectContext, EffectKind, ParamMap};

/// Uniform on/off flashing at `frequency` Hz with the given `dutyCycle`.
pub struct StrobeEffect {
    start_time_ms: f64,
}

impl StrobeEffect {
    pub fn new() -> Self {
        StrobeEffect { start_time_ms: 0.0 }
    }

    pub fn name(&self) -> &'static str {
        "strobe"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::Continuous
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("colorPreset".into(), super::ParamValue::String("white".into()));
        p.insert("brightness".into(), super::ParamValue::Number(1.0));
        p.insert("frequency".into(), super::ParamValue::Number(5.0));
        p.insert("dutyCycle".into(), super::ParamValue::Number(0.5));
        p
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        self.start_time_ms = ctx.elapsed_time_ms;
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let frequency = param_f32(ctx.params, "frequency", 5.0).max(0.001);
        let duty_cycle = param_f32(ctx.params, "dutyCycle", 0.5).clamp(0.0, 1.0);
        let brightness_param = param_f32(ctx.params, "brightness", 1.0);
        let preset_name = param_str(ctx.params, "colorPreset", "white");
        let color = resolve_target_color(ctx.color_manager, preset_name);

        let elapsed = (ctx.elapsed_time_ms - self.start_time_ms) as f32;
        let cycle = 1000.0 / frequency;
        let phase = (elapsed.rem_euclid(cycle)) / cycle;
        let brightness = if phase < duty_cycle { brightness_param } else { 0.0 };

        vec![PanelState::new(color, brightness); ctx.grid.len()]
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        false
    }

    pub fn progress(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{ColorManager, ColorPreset};
    use crate::grid::{PanelGrid, TopologyMode};
    use crate::color::RgbcctColor;

    #[test]
    fn duty_cycle_gates_brightness_over_time() {
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let mut cm = ColorManager::new();
        cm.add_preset(
            "white",
            ColorPreset::Solid {
                color: RgbcctColor::WHITE,
            },
        );
        let mut params = ParamMap::new();
        params.insert("frequency".into(), super::super::ParamValue::Number(10.0));
        params.insert("dutyCycle".into(), super::super::ParamValue::Number(0.5));
        params.insert("colorPreset".into(), super::super::ParamValue::String("white".into()));
        params.insert("brightness".into(), super::super::ParamValue::Number(1.0));

        let mut effect = StrobeEffect::new();
        let init_ctx = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 0.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        effect.initialize(&init_ctx);

        for (elapsed, expected) in [(0.0, 1.0), (51.0, 0.0), (101.0, 1.0)] {
            let ctx = EffectContext {
                delta_time_ms: elapsed,
                elapsed_time_ms: elapsed,
                grid: &grid,
                color_manager: &cm,
                params: &params,
            };
            let states = effect.compute(&ctx);
            assert_eq!(states[0].brightness, expected, "at elapsed={elapsed}");
        }
    }
}
