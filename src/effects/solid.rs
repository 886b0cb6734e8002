use crate::color::RgbcctColor;
use crate::grid::PanelState;

use super::{ease_out_quad, param_color, param_f32, param_str, resolve_target_color, EffectContext, EffectKind, ParamMap};

/// Fades every panel from `startColor` to the resolved `colorPreset`
/// color over `transitionDuration`, then reports done.
pub struct SolidEffect {
    start_time_ms: f64,
    start_color: RgbcctColor,
    target_color: RgbcctColor,
    progress: f32,
}

impl SolidEffect {
    pub fn new() -> Self {
        SolidEffect {
            start_time_ms: 0.0,
            start_color: RgbcctColor::BLACK,
            target_color: RgbcctColor::WHITE,
            progress: 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        "solid"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::OneShot
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("colorPreset".into(), super::ParamValue::String("white".into()));
        p.insert("brightness".into(), super::ParamValue::Number(1.0));
        p.insert("transitionDuration".into(), super::ParamValue::Number(1000.0));
        p
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        self.start_time_ms = ctx.elapsed_time_ms;
        self.start_color = param_color(ctx.params, "startColor", RgbcctColor::BLACK);
        let preset_name = param_str(ctx.params, "colorPreset", "white");
        self.target_color = resolve_target_color(ctx.color_manager, preset_name);
        self.progress = 0.0;
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let duration = param_f32(ctx.params, "transitionDuration", 1000.0).max(0.0);
        let brightness = param_f32(ctx.params, "brightness", 1.0);
        let elapsed = (ctx.elapsed_time_ms - self.start_time_ms) as f32;

        self.progress = if duration <= 0.0 {
            1.0
        } else {
            (elapsed / duration).clamp(0.0, 1.0)
        };
        let eased = ease_out_quad(self.progress);
        let color = self.start_color.lerp(&self.target_color, eased);

        vec![PanelState::new(color, brightness); ctx.grid.len()]
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::ColorManager;
    use crate::grid::{PanelGrid, TopologyMode};

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let cm = ColorManager::new();
        let mut params = ParamMap::new();
        params.insert("colorPreset".into(), super::super::ParamValue::String("white".into()));
        params.insert("brightness".into(), super::super::ParamValue::Number(1.0));
        params.insert("transitionDuration".into(), super::super::ParamValue::Number(0.0));

        let mut effect = SolidEffect::new();
        let ctx = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 0.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        effect.initialize(&ctx);
        let states = effect.compute(&ctx);
        assert!(effect.is_done());
        for s in states {
            assert_eq!(s.color.rgb(), [255, 255, 255]);
            assert_eq!(s.brightness, 1.0);
        }
    }
}
