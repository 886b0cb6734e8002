//! A real-time lighting effect engine for arrays of RGBCCT (red/green/blue/
//! cool-white/warm-white) LED panels.
//!
//! At a fixed target frame rate, [`engine::Engine`] computes per-panel color
//! states from a currently-active [`effects::Effect`] and fans them out to
//! every registered [`engine::Output`] sink — an Art-Net DMX transport
//! ([`output::ArtNetOutput`]), a state broadcaster for UI subscribers
//! ([`output::StateBroadcaster`]), or any other sink implementing the trait.
//! A [`server::CommandServer`] accepts commands over newline-delimited JSON
//! TCP connections to start effects, reshape the panel topology, and manage
//! persisted effect presets ([`preset::PresetManager`]).
//!
//! # Basic usage
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use lumenforge::config::Config;
//! use lumenforge::engine::{Engine, EngineState};
//! use lumenforge::output::{ArtNetOutput, StateBroadcaster};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = Config::load("lumenforge.json");
//!     let mut state = EngineState::new(
//!         config.engine.columns,
//!         config.engine.rows_per_column,
//!         config.engine.initial_topology,
//!     );
//!     state.add_output(Box::new(ArtNetOutput::new(config.artnet.clone())?));
//!     state.add_output(Box::new(StateBroadcaster::new(32)));
//!
//!     let mut engine = Engine::new(Arc::new(Mutex::new(state)), config.engine.target_fps);
//!     engine.start();
//!     Ok(())
//! }
//! ```

pub mod color;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod grid;
pub mod output;
pub mod preset;
pub mod protocol;
pub mod runner;
pub mod server;

pub mod prelude {
    pub use crate::color::RgbcctColor;
    pub use crate::config::Config;
    pub use crate::effects::{Effect, EffectContext, EffectKind, ParamMap, ParamValue};
    pub use crate::engine::{Engine, EngineState, Output};
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::gradient::{ColorManager, ColorPreset, Gradient};
    pub use crate::grid::{Panel, PanelGrid, PanelState, TopologyMode};
    pub use crate::output::{ArtNetConfig, ArtNetOutput, StateBroadcaster};
    pub use crate::preset::{EffectPreset, PresetManager};
    pub use crate::server::CommandServer;
}
