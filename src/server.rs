//! The bidirectional command/event endpoint: one TCP connection per
//! subscriber, newline-delimited JSON in both directions.
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

use crate::engine::EngineState;
use crate::output::StateSnapshot;
use crate::preset::PresetManager;
use crate::protocol::{
    Command, ConnectedPayload, DeletePresetPayload, ErrorPayload, Event, RunEffectPayload, StateUpdatePayload,
};

/// Listens on `bind_addr`, spawning one handler task per connection.
pub struct CommandServer {
    bind_addr: String,
}

impl CommandServer {
    pub fn new(bind_addr: impl Into<String>) -> Self {
        CommandServer {
            bind_addr: bind_addr.into(),
        }
    }

    pub async fn run(
        &self,
        state: Arc<std::sync::Mutex<EngineState>>,
        presets: Arc<Mutex<PresetManager>>,
        state_tx: tokio::sync::broadcast::Sender<StateSnapshot>,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        log::info!("command server listening on {}", self.bind_addr);

        loop {
            let (socket, addr) = listener.accept().await?;
            log::info!("subscriber connected: {addr}");
            let state = state.clone();
            let presets = presets.clone();
            let state_tx = state_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, state, presets, state_tx).await {
                    log::debug!("subscriber {addr} disconnected: {e}");
                } else {
                    log::info!("subscriber disconnected: {addr}");
                }
            });
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    state: Arc<std::sync::Mutex<EngineState>>,
    presets: Arc<Mutex<PresetManager>>,
    state_tx: tokio::sync::broadcast::Sender<StateSnapshot>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::channel::<Event>(64);

    let writer_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => {
                    if write_half.write_all(line.as_bytes()).await.is_err() {
                        break;
                    }
                    if write_half.write_all(b"\n").await.is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("failed to serialize outbound event: {e}"),
            }
        }
    });

    let forward_tx = tx.clone();
    let mut state_rx = state_tx.subscribe();
    let forwarder_task = tokio::spawn(async move {
        loop {
            match state_rx.recv().await {
                Ok(snapshot) => {
                    if forward_tx.send(snapshot_to_event(snapshot)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    send_connected(&state, &tx).await;

    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match serde_json::from_str::<Command>(&line) {
            Ok(c) => c,
            Err(e) => {
                let _ = tx
                    .send(Event::Error {
                        payload: ErrorPayload {
                            kind: "invalid_command".into(),
                            message: e.to_string(),
                        },
                    })
                    .await;
                continue;
            }
        };
        dispatch(command, &state, &presets, &tx).await;
    }

    forwarder_task.abort();
    writer_task.abort();
    Ok(())
}

async fn send_connected(state: &Arc<std::sync::Mutex<EngineState>>, tx: &mpsc::Sender<Event>) {
    let payload = {
        let state = state.lock().expect("lock engine state");
        ConnectedPayload {
            columns: state.grid.columns(),
            rows_per_column: state.grid.rows_per_column(),
            topology: state.grid.mode(),
            current_effect: state.runner.current_name().map(str::to_string),
        }
    };
    let _ = tx.send(Event::Connected { payload }).await;
}

fn snapshot_to_event(snapshot: StateSnapshot) -> Event {
    Event::StateUpdate {
        payload: StateUpdatePayload {
            panels: snapshot.panels,
            current_effect: snapshot.current_effect,
            timestamp: snapshot.timestamp,
        },
    }
}

async fn dispatch(
    command: Command,
    state: &Arc<std::sync::Mutex<EngineState>>,
    presets: &Arc<Mutex<PresetManager>>,
    tx: &mpsc::Sender<Event>,
) {
    match command {
        Command::RunEffect { payload } => match payload {
            RunEffectPayload::ByName { effect_name, params } => {
                let result = state.lock().expect("lock engine state").run_effect(&effect_name, &params);
                if let Err(e) = result {
                    send_error(tx, &e).await;
                }
            }
            RunEffectPayload::ByPreset { preset_id } => {
                let preset = presets.lock().await.get(&preset_id).cloned();
                match preset {
                    Some(preset) => {
                        let mut state = state.lock().expect("lock engine state");
                        state.grid.set_mode(preset.topology);
                        if let Err(e) = state.run_effect(&preset.effect, &preset.params) {
                            drop(state);
                            send_error(tx, &e).await;
                        }
                    }
                    None => {
                        send_error(
                            tx,
                            &crate::error::EngineError::NotFound(format!("preset '{preset_id}' not found")),
                        )
                        .await;
                    }
                }
            }
        },
        Command::StopEffect => {
            state.lock().expect("lock engine state").stop_current_effect();
        }
        Command::SetTopology { payload } => {
            state.lock().expect("lock engine state").grid.set_mode(payload.mode);
        }
        Command::AddPreset { payload } => {
            state
                .lock()
                .expect("lock engine state")
                .color_manager
                .add_preset(payload.name, payload.preset);
        }
        Command::SavePreset { payload } => {
            let result = presets
                .lock()
                .await
                .create(&payload.id, &payload.name, &payload.effect, payload.topology, payload.params);
            match result {
                Ok(preset) => {
                    let _ = tx.send(Event::PresetSaved { payload: preset }).await;
                }
                Err(e) => send_error(tx, &e).await,
            }
        }
        Command::UpdatePreset { mut payload } => {
            let id = payload
                .as_object_mut()
                .and_then(|o| o.remove("id"))
                .and_then(|v| v.as_str().map(str::to_string));
            match id {
                Some(id) => match presets.lock().await.update(&id, payload) {
                    Ok(preset) => {
                        let _ = tx.send(Event::PresetUpdated { payload: preset }).await;
                    }
                    Err(e) => send_error(tx, &e).await,
                },
                None => {
                    send_error(
                        tx,
                        &crate::error::EngineError::InvalidCommand("updatePreset payload missing 'id'".into()),
                    )
                    .await;
                }
            }
        }
        Command::DeletePreset { payload } => match presets.lock().await.delete(&payload.id) {
            Ok(()) => {
                let _ = tx
                    .send(Event::PresetDeleted {
                        payload: DeletePresetPayload { id: payload.id },
                    })
                    .await;
            }
            Err(e) => send_error(tx, &e).await,
        },
        Command::ListPresets => {
            let list = presets.lock().await.get_all().into_iter().cloned().collect();
            let _ = tx.send(Event::PresetsList { payload: list }).await;
        }
    }
}

async fn send_error(tx: &mpsc::Sender<Event>, e: &crate::error::EngineError) {
    let _ = tx.send(Event::Error { payload: e.into() }).await;
}
