use crate::color::RgbcctColor;
use crate::grid::PanelState;

use super::{ease_out_cubic, param_f32, EffectContext, EffectKind, ParamMap};

/// Holds the grid at a caller-supplied per-panel color list, smoothly
/// transitioning whenever `panelColors` changes. Unlike the one-shot
/// effects this never reports done: a new `panelColors` value just
/// restarts the transition in place.
pub struct StaticEffect {
    initialized: bool,
    target_colors: Vec<RgbcctColor>,
    previous_colors: Vec<RgbcctColor>,
    transition_start_ms: f64,
    progress: f32,
}

impl StaticEffect {
    pub fn new() -> Self {
        StaticEffect {
            initialized: false,
            target_colors: Vec::new(),
            previous_colors: Vec::new(),
            transition_start_ms: 0.0,
            progress: 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        "static"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::Continuous
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("panelColors".into(), super::ParamValue::ColorList(Vec::new()));
        p.insert("brightness".into(), super::ParamValue::Number(1.0));
        p.insert("transitionDuration".into(), super::ParamValue::Number(500.0));
        p
    }

    pub fn initialize(&mut self, _ctx: &EffectContext) {
        self.initialized = false;
        self.target_colors = Vec::new();
        self.previous_colors = Vec::new();
        self.progress = 1.0;
    }

    fn desired_colors(&self, ctx: &EffectContext) -> Vec<RgbcctColor> {
        let requested = ctx
            .params
            .get("panelColors")
            .and_then(super::ParamValue::as_color_list)
            .unwrap_or(&[]);
        let n = ctx.grid.len();
        let mut colors = vec![RgbcctColor::BLACK; n];
        for (i, c) in requested.iter().take(n).enumerate() {
            colors[i] = *c;
        }
        colors
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let brightness = param_f32(ctx.params, "brightness", 1.0);
        let duration = param_f32(ctx.params, "transitionDuration", 500.0).max(0.0);
        let desired = self.desired_colors(ctx);

        if !self.initialized {
            self.previous_colors = ctx.grid.states().iter().map(|s| s.color).collect();
            self.target_colors = desired;
            self.transition_start_ms = ctx.elapsed_time_ms;
            self.initialized = true;
        } else if desired != self.target_colors {
            self.previous_colors = ctx.grid.states().iter().map(|s| s.color).collect();
            self.target_colors = desired;
            self.transition_start_ms = ctx.elapsed_time_ms;
        }

        let elapsed = (ctx.elapsed_time_ms - self.transition_start_ms) as f32;
        self.progress = if duration <= 0.0 {
            1.0
        } else {
            (elapsed / duration).clamp(0.0, 1.0)
        };
        let eased = ease_out_cubic(self.progress);

        self.previous_colors
            .iter()
            .zip(self.target_colors.iter())
            .map(|(from, to)| PanelState::new(from.lerp(to, eased), brightness))
            .collect()
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        false
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
    fn restarts_transition_when_target_changes() {
        let grid = PanelGrid::new(1, 2, TopologyMode::Singular);
        let cm = ColorManager::new();
        let mut params = ParamMap::new();
        params.insert(
            "panelColors".into(),
            super::super::ParamValue::ColorList(vec![RgbcctColor::new(255, 0, 0, 0, 0), RgbcctColor::BLACK]),
        );
        params.insert("brightness".into(), super::super::ParamValue::Number(1.0));
        params.insert("transitionDuration".into(), super::super::ParamValue::Number(100.0));

        let mut effect = StaticEffect::new();
        let ctx0 = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 0.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        effect.initialize(&ctx0);
        let _ = effect.compute(&ctx0);

        let ctx_done = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 100.0,
            grid: &grid,
            color_manager: &cm,
            params: &params,
        };
        let states = effect.compute(&ctx_done);
        assert_eq!(states[0].color.r, 255);

        let mut params2 = params.clone();
        params2.insert(
            "panelColors".into(),
            super::super::ParamValue::ColorList(vec![RgbcctColor::new(0, 255, 0, 0, 0), RgbcctColor::BLACK]),
        );
        let ctx_changed = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms: 100.0,
            grid: &grid,
            color_manager: &cm,
            params: &params2,
        };
        let states = effect.compute(&ctx_changed);
        // transition just restarted, progress should be 0 -> still mostly red
        assert_eq!(states[0].color.r, 255);
        assert_eq!(states[0].color.g, 0);
    }
}
