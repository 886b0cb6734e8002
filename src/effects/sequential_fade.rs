use crate::color::RgbcctColor;
use crate::grid::PanelState;

use super::{ease_out_quad, param_color, param_f32, param_str, resolve_target_color, EffectContext, EffectKind, ParamMap};

/// Fades each panel in from `startColor` to the resolved target color,
/// staggered by its index within its topology sequence.
pub struct SequentialFadeEffect {
    start_time_ms: f64,
    start_color: RgbcctColor,
    target_color: RgbcctColor,
    done: bool,
}

impl SequentialFadeEffect {
    pub fn new() -> Self {
        SequentialFadeEffect {
            start_time_ms: 0.0,
            start_color: RgbcctColor::BLACK,
            target_color: RgbcctColor::WHITE,
            done: false,
        }
    }

    pub fn name(&self) -> &'static str {
        "sequential_fade"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::OneShot
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("colorPreset".into(), super::ParamValue::String("white".into()));
        p.insert("brightness".into(), super::ParamValue::Number(1.0));
        p.insert("delayBetweenPanels".into(), super::ParamValue::Number(100.0));
        p.insert("fadeDuration".into(), super::ParamValue::Number(500.0));
        p
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        self.start_time_ms = ctx.elapsed_time_ms;
        self.start_color = param_color(ctx.params, "startColor", RgbcctColor::BLACK);
        let preset_name = param_str(ctx.params, "colorPreset", "white");
        self.target_color = resolve_target_color(ctx.color_manager, preset_name);
        self.done = false;
    }

    /// `delayBetweenPanels`/`fadeDuration` as effectively used this tick:
    /// either the explicit params, or `transitionDuration` split 30/70
    /// across the whole grid.
    fn timing(&self, ctx: &EffectContext) -> (f32, f32) {
        if let Some(total) = ctx.params.get("transitionDuration").and_then(super::ParamValue::as_f64) {
            let n = ctx.grid.len().max(1) as f32;
            let total = total as f32;
            (0.3 * total / n, 0.7 * total)
        } else {
            (
                param_f32(ctx.params, "delayBetweenPanels", 100.0),
                param_f32(ctx.params, "fadeDuration", 500.0),
            )
        }
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let (delay, fade) = self.timing(ctx);
        let brightness = param_f32(ctx.params, "brightness", 1.0);
        let elapsed = (ctx.elapsed_time_ms - self.start_time_ms) as f32;

        let mut states = vec![PanelState::new(self.start_color, brightness); ctx.grid.len()];
        let mut all_done = true;

        for sequence in ctx.grid.sequences() {
            for (k, &panel_id) in sequence.iter().enumerate() {
                let local_start = k as f32 * delay;
                let local_progress = if fade <= 0.0 {
                    if elapsed >= local_start {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    ((elapsed - local_start) / fade).clamp(0.0, 1.0)
                };
                if local_progress < 1.0 {
                    all_done = false;
                }
                let eased = ease_out_quad(local_progress);
                let color = self.start_color.lerp(&self.target_color, eased);
                if let Some(state) = states.get_mut(panel_id) {
                    *state = PanelState::new(color, brightness);
                }
            }
        }

        self.done = all_done;
        states
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn progress(&self) -> f32 {
        if self.done {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{ColorManager, ColorPreset};
    use crate::grid::{PanelGrid, TopologyMode};

    fn red_color_manager() -> ColorManager {
        let mut cm = ColorManager::new();
        cm.add_preset(
            "red",
            ColorPreset::Solid {
                color: RgbcctColor::new(255, 0, 0, 0, 0),
            },
        );
        cm
    }

    #[test]
    fn staggered_brightness_at_150ms() {
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let cm = red_color_manager();
        let mut params = ParamMap::new();
        params.insert("colorPreset".into(), super::super::ParamValue::String("red".into()));
        params.insert("brightness".into(), super::super::ParamValue::Number(1.0));
        params.insert("delayBetweenPanels".into(), super::super::ParamValue::Number(100.0));
        params.insert("fadeDuration".into(), super::super::ParamValue::Number(500.0));

        let mut effect = SequentialFadeEffect::new();
        let init_ctx = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 0.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        effect.initialize(&init_ctx);

        let ctx = EffectContext {
            delta_time_ms: 150.0,
            elapsed_time_ms: 150.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        let states = effect.compute(&ctx);
        // ease_out_quad(150/500) = ease_out_quad(0.3) = 0.3*(2-0.3) = 0.51
        assert!((states[0].brightness - 1.0).abs() < 1e-6);
        assert!(states[0].color.r > 120 && states[0].color.r < 140);
        // panel index 1: ease_out_quad(50/500)=ease_out_quad(0.1)=0.1*1.9=0.19
        assert!(states[1].color.r > 40 && states[1].color.r < 55);
        // panel index 2 hasn't started yet
        assert_eq!(states[2].color.rgb(), [0, 0, 0]);
        assert!(!effect.is_done());
    }
}
