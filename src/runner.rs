//! Drives the single currently-active [`Effect`] through its lifecycle.
//! The engine owns one `EffectRunner`; nothing outside it touches an
//! effect's internal state directly.
use std::panic::{self, AssertUnwindSafe};

use crate::effects::{effect_defaults, make_effect, merge_params, Effect, EffectContext, ParamMap};
use crate::gradient::ColorManager;
use crate::grid::{PanelGrid, PanelState};

/// Holds at most one running effect and the effective params it was
/// started with (its defaults overridden by caller-supplied params).
#[derive(Default)]
pub struct EffectRunner {
    current: Option<Effect>,
    params: ParamMap,
}

impl EffectRunner {
    pub fn new() -> Self {
        EffectRunner {
            current: None,
            params: ParamMap::new(),
        }
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|e| e.name())
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Look up `name`'s defaults, merge in `overrides`, construct and
    /// initialize the effect, and clean up whatever was running before.
    /// Returns `false` for an unrecognized effect name; the caller turns
    /// that into `EngineError::NotFound`.
    pub fn set_effect(
        &mut self,
        name: &str,
        overrides: &ParamMap,
        grid: &PanelGrid,
        color_manager: &ColorManager,
        elapsed_time_ms: f64,
    ) -> bool {
        let defaults = match effect_defaults(name) {
            Some(d) => d,
            None => return false,
        };
        let mut effect = match make_effect(name) {
            Some(e) => e,
            None => return false,
        };

        if let Some(mut prev) = self.current.take() {
            prev.cleanup();
        }

        let params = merge_params(&defaults, overrides);
        let ctx = EffectContext {
            delta_time_ms: 0.0,
            elapsed_time_ms,
            grid,
            color_manager,
            params: &params,
        };
        effect.initialize(&ctx);

        self.params = params;
        self.current = Some(effect);
        true
    }

    /// Clear the runner, invoking the outgoing effect's cleanup if one
    /// was active.
    pub fn stop(&mut self) {
        if let Some(mut effect) = self.current.take() {
            effect.cleanup();
        }
        self.params = ParamMap::new();
    }

    /// Compute one frame. Returns `None` when idle. A panic inside the
    /// active effect's `compute` is caught so it can't wedge the tick
    /// loop: it's reported to the caller as `None` and the runner is
    /// cleared, matching a `stopCurrentEffect`.
    pub fn update(
        &mut self,
        grid: &PanelGrid,
        color_manager: &ColorManager,
        delta_time_ms: f64,
        elapsed_time_ms: f64,
    ) -> Option<Vec<PanelState>> {
        let effect = self.current.as_mut()?;
        let ctx = EffectContext {
            delta_time_ms,
            elapsed_time_ms,
            grid,
            color_manager,
            params: &self.params,
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| effect.compute(&ctx)));
        let states = match result {
            Ok(states) => states,
            Err(_) => {
                log::error!("effect '{}' panicked during compute; stopping it", effect.name());
                self.stop();
                return None;
            }
        };

        if effect.is_done() {
            log::debug!("effect '{}' completed", effect.name());
            self.current = None;
            self.params = ParamMap::new();
        }

        Some(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TopologyMode;

    #[test]
    fn unknown_effect_name_is_rejected() {
        let mut runner = EffectRunner::new();
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let cm = ColorManager::new();
        let ok = runner.set_effect("glitter", &ParamMap::new(), &grid, &cm, 0.0);
        assert!(!ok);
        assert!(!runner.is_running());
    }

    #[test]
    fn zero_duration_solid_completes_and_clears_on_next_update() {
        let mut runner = EffectRunner::new();
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let cm = ColorManager::new();
        let mut overrides = ParamMap::new();
        overrides.insert(
            "transitionDuration".into(),
            crate::effects::ParamValue::Number(0.0),
        );
        assert!(runner.set_effect("solid", &overrides, &grid, &cm, 0.0));
        assert!(runner.is_running());

        let states = runner.update(&grid, &cm, 0.0, 0.0);
        assert!(states.is_some());
        assert!(!runner.is_running(), "one-shot effect should clear itself once done");
    }

    #[test]
    fn stop_invokes_cleanup_and_clears_state() {
        let mut runner = EffectRunner::new();
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let cm = ColorManager::new();
        runner.set_effect("flow", &ParamMap::new(), &grid, &cm, 0.0);
        assert!(runner.is_running());
        runner.stop();
        assert!(!runner.is_running());
        assert!(runner.update(&grid, &cm, 16.0, 16.0).is_none());
    }
}
