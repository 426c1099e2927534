use serde::{Deserialize, Serialize};

pub use connect::*;
pub use error::*;
pub use event::*;
pub use flow::*;
pub use game::*;
pub use generator::*;
pub use grid::*;
pub use queue::*;
pub use tile::*;
pub use types::*;

mod connect;
mod error;
mod event;
mod flow;
mod game;
mod generator;
mod grid;
mod queue;
mod tile;
mod types;

/// Settings read once at construction; the live objects never consult
/// them again.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub cols: Coord,
    /// Per-cell probability of a path blocker at generation.
    pub block_chance: f64,
    /// Preview countdown before the flow starts.
    pub countdown_ms: f32,
    /// Seconds one pipe takes to fill.
    pub fill_seconds: f32,
    pub min_target: CellCount,
    pub max_target: CellCount,
}

impl GameConfig {
    pub fn new(rows: Coord, cols: Coord) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub fn validate(&self) -> Result<()> {
        let dims_ok = self.rows >= 1 && self.cols >= 1;
        let chance_ok = (0.0..=1.0).contains(&self.block_chance);
        let timing_ok = self.countdown_ms >= 0.0 && self.fill_seconds > 0.0;
        let target_ok = self.min_target >= 1 && self.min_target <= self.max_target;

        if dims_ok && chance_ok && timing_ok && target_ok {
            Ok(())
        } else {
            Err(GameError::InvalidConfiguration)
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 9,
            cols: 7,
            block_chance: 0.05,
            countdown_ms: 15_000.0,
            fill_seconds: 2.0,
            min_target: 15,
            max_target: 20,
        }
    }
}
