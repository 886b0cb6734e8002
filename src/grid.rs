//! The panel array: fixed identity/layout (`Panel`), per-panel live state
//! (`PanelState`), and the traversal orders (`Sequence`) effects iterate
//! over under each [`TopologyMode`].
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::color::RgbcctColor;
use crate::error::{EngineError, EngineResult};

/// Immutable identity of one addressable panel: its index and derived
/// column/row under the grid's fixed `rows_per_column`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub id: usize,
    pub column: usize,
    pub row: usize,
}

/// Live per-panel output: color, brightness, and the monotonic timestamp
/// (ms) of the last write.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PanelState {
    pub color: RgbcctColor,
    pub brightness: f32,
    pub timestamp: u64,
}

impl PanelState {
    pub fn black() -> Self {
        PanelState {
            color: RgbcctColor::BLACK,
            brightness: 0.0,
            timestamp: now_millis(),
        }
    }

    pub fn new(color: RgbcctColor, brightness: f32) -> Self {
        PanelState {
            color,
            brightness: brightness.clamp(0.0, 1.0),
            timestamp: now_millis(),
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The panel-traversal order effects use. `Circular` and `Singular`
/// collapse the grid into a single sequence; `Linear` yields one sequence
/// per column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyMode {
    Circular,
    Linear,
    Singular,
}

/// An ordered traversal of panel ids.
pub type Sequence = Vec<usize>;

/// Owns the fixed panel array and current topology mode. The engine is
/// the sole writer of panel state; everything else only reads snapshots.
#[derive(Debug)]
pub struct PanelGrid {
    columns: usize,
    rows_per_column: usize,
    panels: Vec<Panel>,
    states: Vec<PanelState>,
    mode: TopologyMode,
}

impl PanelGrid {
    pub fn new(columns: usize, rows_per_column: usize, mode: TopologyMode) -> Self {
        let n = columns * rows_per_column;
        let panels = (0..n)
            .map(|id| Panel {
                id,
                column: id / rows_per_column,
                row: id % rows_per_column,
            })
            .collect();
        let states = (0..n).map(|_| PanelState::black()).collect();

        PanelGrid {
            columns,
            rows_per_column,
            panels,
            states,
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows_per_column(&self) -> usize {
        self.rows_per_column
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn mode(&self) -> TopologyMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TopologyMode) {
        self.mode = mode;
    }

    pub fn states(&self) -> &[PanelState] {
        &self.states
    }

    pub fn get(&self, id: usize) -> EngineResult<PanelState> {
        self.states
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::InvalidParam(format!("panel {id} out of range")))
    }

    pub fn set(&mut self, id: usize, color: RgbcctColor, brightness: f32) -> EngineResult<()> {
        let state = self
            .states
            .get_mut(id)
            .ok_or_else(|| EngineError::InvalidParam(format!("panel {id} out of range")))?;
        *state = PanelState::new(color, brightness);
        Ok(())
    }

    /// Replace every panel's state. `states` must have exactly `len()`
    /// entries; each is re-stamped with the current time.
    pub fn set_all(&mut self, states: Vec<PanelState>) -> EngineResult<()> {
        if states.len() != self.panels.len() {
            return Err(EngineError::InvalidParam(format!(
                "expected {} panel states, got {}",
                self.panels.len(),
                states.len()
            )));
        }
        let now = now_millis();
        self.states = states
            .into_iter()
            .map(|mut s| {
                s.timestamp = now;
                s
            })
            .collect();
        Ok(())
    }

    pub fn set_uniform(&mut self, color: RgbcctColor, brightness: f32) {
        let state = PanelState::new(color, brightness);
        for s in &mut self.states {
            *s = state;
        }
    }

    /// The ordered traversals effects iterate over under the grid's
    /// current topology mode. See `sequences_for` for the generalized
    /// circular shape.
    pub fn sequences(&self) -> Vec<Sequence> {
        sequences_for(self.mode, self.columns, self.rows_per_column)
    }
}

/// Pure function computing the sequence set for a given shape and mode,
/// so tests can check topologies without constructing a full grid.
pub fn sequences_for(mode: TopologyMode, columns: usize, rows_per_column: usize) -> Vec<Sequence> {
    match mode {
        TopologyMode::Linear => (0..columns)
            .map(|c| {
                let base = c * rows_per_column;
                (base..base + rows_per_column).collect()
            })
            .collect(),
        TopologyMode::Singular => vec![(0..columns * rows_per_column).collect()],
        TopologyMode::Circular => {
            let mut seq = Vec::with_capacity(columns * rows_per_column);
            for c in 0..columns {
                let base = c * rows_per_column;
                let mut col: Vec<usize> = (base..base + rows_per_column).collect();
                if c % 2 == 1 {
                    col.reverse();
                }
                seq.extend(col);
            }
            vec![seq]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_sequences_cover_every_panel_once() {
        let seqs = sequences_for(TopologyMode::Linear, 3, 4);
        let mut all: Vec<usize> = seqs.into_iter().flatten().collect();
        all.sort();
        assert_eq!(all, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn singular_sequence_is_id_order() {
        let seqs = sequences_for(TopologyMode::Singular, 2, 7);
        assert_eq!(seqs, vec![(0..14).collect::<Vec<_>>()]);
    }

    #[test]
    fn canonical_circular_topology_c2_r7() {
        let seqs = sequences_for(TopologyMode::Circular, 2, 7);
        assert_eq!(seqs, vec![vec![0, 1, 2, 3, 4, 5, 6, 13, 12, 11, 10, 9, 8, 7]]);
    }

    #[test]
    fn circular_generalizes_to_more_columns() {
        let seqs = sequences_for(TopologyMode::Circular, 3, 2);
        // even columns ascending, odd columns descending, concatenated
        assert_eq!(seqs, vec![vec![0, 1, 3, 2, 4, 5]]);
    }

    #[test]
    fn set_all_requires_exact_length() {
        let mut grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        let err = grid.set_all(vec![PanelState::black(); 3]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParam(_)));
    }

    #[test]
    fn out_of_range_panel_is_an_error() {
        let grid = PanelGrid::new(2, 7, TopologyMode::Linear);
        assert!(grid.get(14).is_err());
    }
}
