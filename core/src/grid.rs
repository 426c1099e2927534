use core::mem;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Owns the board and every tile on it. The grid is the sole mutator of
/// tile *type* (placement and replacement); fill/flow status is mutated
/// only through the crate-private setters used by the flow engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    tiles: Array2<Tile>,
    start: Coord2,
    blocked: Vec<Coord2>,
    game_over: bool,
}

impl Grid {
    pub(crate) fn from_parts(tiles: Array2<Tile>, start: Coord2, blocked: Vec<Coord2>) -> Self {
        Self {
            tiles,
            start,
            blocked,
            game_over: false,
        }
    }

    /// Builds a grid from an explicit tile layout, for scripted boards.
    /// `start` must point at the single `Tile::Start` on the board.
    pub fn from_tiles(tiles: Array2<Tile>, start: Coord2) -> Result<Self> {
        let (rows, cols) = tiles.dim();
        if rows == 0 || cols == 0 || rows > Coord::MAX as usize || cols > Coord::MAX as usize {
            return Err(GameError::InvalidConfiguration);
        }

        let start_count = tiles
            .iter()
            .filter(|tile| matches!(tile, Tile::Start(_)))
            .count();
        if start_count != 1 || !matches!(tiles.get(start.to_nd_index()), Some(Tile::Start(_))) {
            return Err(GameError::InvalidConfiguration);
        }

        let blocked = tiles
            .indexed_iter()
            .filter(|(_, tile)| matches!(tile, Tile::Blocker))
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .collect();

        Ok(Self::from_parts(tiles, start, blocked))
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.tiles.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn rows(&self) -> Coord {
        self.size().0
    }

    pub fn cols(&self) -> Coord {
        self.size().1
    }

    /// Coordinates of the starting-point tile.
    pub fn start(&self) -> Coord2 {
        self.start
    }

    /// Cells flagged as blocked at generation time.
    pub fn blocked_cells(&self) -> &[Coord2] {
        &self.blocked
    }

    /// Tile at `coords`, or `None` when out of bounds. Never panics.
    pub fn tile_at(&self, coords: Coord2) -> Option<&Tile> {
        self.tiles.get(coords.to_nd_index())
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Freezes tile replacement from this point on. Idempotent.
    pub fn mark_game_over(&mut self) {
        if !self.game_over {
            log::debug!("grid frozen, no further replacements accepted");
            self.game_over = true;
        }
    }

    /// Swaps the tile at `coords` for a fresh pipe of `shape`, returning
    /// the discarded tile for caller-side bookkeeping. All-or-nothing: on
    /// any error the cell is left untouched.
    pub fn replace_tile(&mut self, coords: Coord2, shape: PipeShape) -> Result<Tile> {
        let tile = self
            .tiles
            .get_mut(coords.to_nd_index())
            .ok_or(GameError::InvalidCoords)?;

        if self.game_over || !tile.is_replaceable() {
            return Err(GameError::InvalidReplacement);
        }

        let old = mem::replace(tile, Tile::pipe(shape));
        log::debug!("replaced {:?} at {:?} with {:?}", old.kind(), coords, shape);
        Ok(old)
    }

    /// Marks the pipe at `coords` as having water flowing through it.
    /// Returns whether the flag actually flipped.
    pub(crate) fn set_flowing(&mut self, coords: Coord2) -> bool {
        let Some(state) = self
            .tiles
            .get_mut(coords.to_nd_index())
            .and_then(Tile::flow_state_mut)
        else {
            return false;
        };

        let changed = !state.flowing;
        state.flowing = true;
        changed
    }

    /// Marks the pipe at `coords` as completely filled; a filled pipe is
    /// no longer flowing. Returns whether the flags actually flipped.
    pub(crate) fn set_filled(&mut self, coords: Coord2) -> bool {
        let Some(state) = self
            .tiles
            .get_mut(coords.to_nd_index())
            .and_then(Tile::flow_state_mut)
        else {
            return false;
        };

        let changed = !state.filled || state.flowing;
        state.filled = true;
        state.flowing = false;
        changed
    }
}
