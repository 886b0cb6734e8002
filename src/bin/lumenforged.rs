use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use lumenforge::config::Config;
use lumenforge::engine::{Engine, EngineState};
use lumenforge::output::{ArtNetOutput, StateBroadcaster};
use lumenforge::preset::PresetManager;
use lumenforge::server::CommandServer;

const CONFIG_PATH: &str = "lumenforge.json";

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::load(CONFIG_PATH);
    log::info!(
        "starting lumenforge: {}x{} panels, {} fps, topology {:?}",
        config.engine.columns,
        config.engine.rows_per_column,
        config.engine.target_fps,
        config.engine.initial_topology,
    );

    let mut state = EngineState::new(
        config.engine.columns,
        config.engine.rows_per_column,
        config.engine.initial_topology,
    );
    state.color_manager.load_presets_from_config(config.presets.clone());

    let artnet = match ArtNetOutput::new(config.artnet.clone()) {
        Ok(artnet) => artnet,
        Err(e) => {
            log::error!("failed to initialize art-net socket: {e}; art-net output disabled");
            let mut disabled = config.artnet.clone();
            disabled.enabled = false;
            ArtNetOutput::new(disabled).expect("a disabled art-net sink never binds a socket")
        }
    };
    let artnet = Arc::new(Mutex::new(artnet));
    state.add_output(Box::new(ArtNetSink(artnet.clone())));

    let broadcaster = StateBroadcaster::new(64);
    let state_tx = broadcaster.sender_handle();
    state.add_output(Box::new(broadcaster));

    let presets = match PresetManager::load(&config.preset_store_path) {
        Ok(presets) => presets,
        Err(e) => {
            log::error!("failed to load preset store: {e}");
            std::process::exit(1);
        }
    };
    let presets = Arc::new(AsyncMutex::new(presets));

    let engine_state = Arc::new(Mutex::new(state));
    let mut engine = Engine::new(engine_state.clone(), config.engine.target_fps);
    engine.start();

    let server = CommandServer::new(config.bind_addr.clone());
    let server_state = engine_state.clone();
    let server_presets = presets.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(server_state, server_presets, state_tx).await {
            log::error!("command server exited: {e}");
        }
    });

    wait_for_shutdown_signal().await;
    log::info!("shutdown signal received, draining");

    engine.stop();
    server_task.abort();
    artnet.lock().expect("lock art-net sink").shutdown();

    log::info!("lumenforge stopped");
}

/// Waits for either SIGINT or SIGTERM. On platforms without Unix signal
/// support, falls back to Ctrl-C only.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

struct ArtNetSink(Arc<Mutex<ArtNetOutput>>);

impl lumenforge::engine::Output for ArtNetSink {
    fn render(&mut self, grid: &lumenforge::grid::PanelGrid) {
        self.0.lock().expect("lock art-net sink").render(grid);
    }
}
