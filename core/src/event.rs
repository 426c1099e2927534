use serde::{Deserialize, Serialize};

use crate::*;

/// Notification emitted toward the renderer on every observable state
/// change. The core never renders; consumers turn these into pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A cell's tile changed: placed, replaced, started flowing, or
    /// finished filling.
    Tile {
        row: Coord,
        col: Coord,
        kind: TileKind,
        open: DirSet,
        filled: bool,
        flowing: bool,
    },
    /// The flow state machine advanced: countdown expiry, a completed
    /// segment, or a terminal transition.
    Flow {
        status: FlowStatus,
        distance: CellCount,
        target: CellCount,
    },
}

impl GameEvent {
    pub(crate) fn tile(coords: Coord2, tile: &Tile) -> Self {
        let state = tile.flow_state().copied().unwrap_or(PipeState::new(DirSet::empty()));
        GameEvent::Tile {
            row: coords.0,
            col: coords.1,
            kind: tile.kind(),
            open: state.open,
            filled: state.filled,
            flowing: state.flowing,
        }
    }

    pub(crate) fn flow(engine: &FlowEngine) -> Self {
        GameEvent::Flow {
            status: engine.status(),
            distance: engine.distance_travelled(),
            target: engine.target_distance(),
        }
    }
}
