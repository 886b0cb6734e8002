use crate::grid::PanelState;

use super::{ease_in_out_quad, param_f32, EffectContext, EffectKind, ParamMap};

/// Fades every panel from the grid state captured at the moment this
/// effect started down to black, then reports done.
pub struct BlackoutEffect {
    start_time_ms: f64,
    captured: Vec<PanelState>,
    progress: f32,
}

impl BlackoutEffect {
    pub fn new() -> Self {
        BlackoutEffect {
            start_time_ms: 0.0,
            captured: Vec::new(),
            progress: 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        "blackout"
    }

    pub fn kind(&self) -> EffectKind {
        EffectKind::OneShot
    }

    pub fn defaults(&self) -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("transitionDuration".into(), super::ParamValue::Number(500.0));
        p
    }

    pub fn initialize(&mut self, ctx: &EffectContext) {
        self.start_time_ms = ctx.elapsed_time_ms;
        self.captured = ctx.grid.states().to_vec();
        self.progress = 0.0;
    }

    pub fn compute(&mut self, ctx: &EffectContext) -> Vec<PanelState> {
        let duration = param_f32(ctx.params, "transitionDuration", 500.0).max(0.0);
        let elapsed = (ctx.elapsed_time_ms - self.start_time_ms) as f32;

        self.progress = if duration <= 0.0 {
            1.0
        } else {
            (elapsed / duration).clamp(0.0, 1.0)
        };
        let eased = ease_in_out_quad(self.progress);
        let remaining = 1.0 - eased;

        self.captured
            .iter()
            .map(|s| PanelState::new(s.color.scaled(remaining), s.brightness * remaining))
            .collect()
    }

    pub fn cleanup(&mut self) {}

    pub fn is_done(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}
