//! Publishes per-frame state snapshots to any number of command-protocol
//! subscribers via a broadcast channel. A slow subscriber simply misses
//! frames rather than slowing the tick: "latest state preferred over
//! complete history".
use serde::Serialize;
use tokio::sync::broadcast;

use crate::engine::Output;
use crate::grid::{PanelGrid, PanelState};

/// One tick's worth of state, as delivered to subscribers.
#[derive(Clone, Debug, Serialize)]
pub struct StateSnapshot {
    pub panels: Vec<PanelState>,
    pub current_effect: Option<String>,
    pub timestamp: u64,
}

/// A sink that fans grid snapshots out over a `tokio::sync::broadcast`
/// channel. Subscribers that fall behind the channel's capacity silently
/// drop old frames (the channel itself coalesces via lagged-receiver
/// semantics); this sink never blocks on send.
pub struct StateBroadcaster {
    sender: broadcast::Sender<StateSnapshot>,
    current_effect: Option<String>,
}

impl StateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        StateBroadcaster {
            sender,
            current_effect: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.sender.subscribe()
    }

    /// A cloned handle subscribers can use to call `subscribe()` without
    /// sharing ownership of the sink itself (the sink stays uniquely owned
    /// by the engine's output list; `broadcast::Sender` is cheap to clone).
    pub fn sender_handle(&self) -> broadcast::Sender<StateSnapshot> {
        self.sender.clone()
    }

    pub fn set_current_effect(&mut self, name: Option<String>) {
        self.current_effect = name;
    }
}

impl Output for StateBroadcaster {
    fn render(&mut self, grid: &PanelGrid) {
        let snapshot = StateSnapshot {
            panels: grid.states().to_vec(),
            current_effect: self.current_effect.clone(),
            timestamp: crate::grid::now_millis(),
        };
        // send() only errors when there are no receivers; that's a normal
        // state (no subscribers yet), not a failure worth logging.
        let _ = self.sender.send(snapshot);
    }
}
