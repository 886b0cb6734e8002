//! The fixed-rate tick scheduler. Owns the grid, the color manager, the
//! runner, and the list of output sinks; everything else interacts with
//! it through a shared, mutex-guarded handle.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::effects::ParamMap;
use crate::error::{EngineError, EngineResult};
use crate::gradient::ColorManager;
use crate::grid::{now_millis, PanelGrid, TopologyMode};
use crate::runner::EffectRunner;

/// A consumer of per-frame panel state. `render` must not block the tick;
/// a slow sink should drop or coalesce internally rather than stall.
pub trait Output: Send {
    fn render(&mut self, grid: &PanelGrid);
}

/// Everything the tick task and every connection-handling task share
/// behind one lock: grid, color library, active effect, sinks, and the
/// running FPS estimate.
pub struct EngineState {
    pub grid: PanelGrid,
    pub color_manager: ColorManager,
    pub runner: EffectRunner,
    outputs: Vec<Box<dyn Output>>,
    start_time_ms: u64,
    last_tick_ms: u64,
    fps_window_start_ms: u64,
    fps_window_ticks: u32,
    fps: f32,
}

impl EngineState {
    pub fn new(columns: usize, rows_per_column: usize, mode: TopologyMode) -> Self {
        let now = now_millis();
        EngineState {
            grid: PanelGrid::new(columns, rows_per_column, mode),
            color_manager: ColorManager::new(),
            runner: EffectRunner::new(),
            outputs: Vec::new(),
            start_time_ms: now,
            last_tick_ms: now,
            fps_window_start_ms: now,
            fps_window_ticks: 0,
            fps: 0.0,
        }
    }

    pub fn add_output(&mut self, output: Box<dyn Output>) {
        self.outputs.push(output);
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn run_effect(&mut self, name: &str, params: &ParamMap) -> EngineResult<()> {
        let elapsed = now_millis().saturating_sub(self.start_time_ms) as f64;
        if self
            .runner
            .set_effect(name, params, &self.grid, &self.color_manager, elapsed)
        {
            log::info!("running effect '{name}'");
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("unknown effect '{name}'")))
        }
    }

    pub fn stop_current_effect(&mut self) {
        if let Some(name) = self.runner.current_name() {
            log::info!("stopping effect '{name}'");
        }
        self.runner.stop();
    }

    /// Advance one frame: compute the active effect, write its states
    /// into the grid if any were produced, then fan the grid out to
    /// every sink. Called by the tick task; also usable directly in
    /// tests without a running scheduler.
    pub fn tick(&mut self) {
        let now = now_millis();
        let delta_ms = now.saturating_sub(self.last_tick_ms) as f64;
        let elapsed_ms = now.saturating_sub(self.start_time_ms) as f64;
        self.last_tick_ms = now;

        if let Some(states) = self
            .runner
            .update(&self.grid, &self.color_manager, delta_ms, elapsed_ms)
        {
            if let Err(e) = self.grid.set_all(states) {
                log::warn!("effect produced malformed states: {e}");
            }
        }

        for output in &mut self.outputs {
            output.render(&self.grid);
        }

        self.fps_window_ticks += 1;
        if now.saturating_sub(self.fps_window_start_ms) >= 1000 {
            self.fps = self.fps_window_ticks as f32 * 1000.0 / (now - self.fps_window_start_ms).max(1) as f32;
            self.fps_window_ticks = 0;
            self.fps_window_start_ms = now;
        }
    }
}

/// Owns the background tick task. Dropping this (or calling `stop`)
/// aborts the task; the task itself never awaits I/O, matching the
/// non-blocking scheduling discipline sinks are required to uphold.
pub struct Engine {
    state: Arc<Mutex<EngineState>>,
    target_fps: u32,
    tick_handle: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(state: Arc<Mutex<EngineState>>, target_fps: u32) -> Self {
        Engine {
            state,
            target_fps: target_fps.max(1),
            tick_handle: None,
        }
    }

    pub fn state(&self) -> Arc<Mutex<EngineState>> {
        self.state.clone()
    }

    /// Idempotent: calling `start` while already running is a no-op.
    pub fn start(&mut self) {
        if self.tick_handle.is_some() {
            return;
        }
        let state = self.state.clone();
        let period = Duration::from_millis((1000 / self.target_fps as u64).max(1));

        self.tick_handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            log::info!("engine started at target {} fps", 1000 / period.as_millis().max(1));
            loop {
                interval.tick().await;
                state.lock().expect("lock engine state").tick();
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            handle.abort();
            log::info!("engine stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbcctColor;

    struct RecordingOutput {
        renders: usize,
    }

    impl Output for RecordingOutput {
        fn render(&mut self, _grid: &PanelGrid) {
            self.renders += 1;
        }
    }

    #[test]
    fn idle_tick_leaves_grid_untouched() {
        let mut state = EngineState::new(2, 7, TopologyMode::Linear);
        state.grid.set_uniform(RgbcctColor::WHITE, 1.0);
        state.tick();
        assert_eq!(state.grid.states()[0].color, RgbcctColor::WHITE);
    }

    #[test]
    fn running_effect_writes_grid_and_calls_outputs() {
        let mut state = EngineState::new(1, 1, TopologyMode::Singular);
        let mut params = ParamMap::new();
        params.insert(
            "transitionDuration".into(),
            crate::effects::ParamValue::Number(0.0),
        );
        state.run_effect("solid", &params).unwrap();
        state.tick();
        assert_eq!(state.grid.states()[0].color, RgbcctColor::WHITE);
    }

    #[test]
    fn unknown_effect_name_is_an_error() {
        let mut state = EngineState::new(1, 1, TopologyMode::Singular);
        assert!(state.run_effect("glitter", &ParamMap::new()).is_err());
    }
}
