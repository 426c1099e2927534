use ndarray::Array2;
use rand::prelude::*;
use smallvec::SmallVec;

use super::*;

/// Generation strategy that scatters path blockers with the configured
/// probability and then places the starting point by rejection sampling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: &GameConfig) -> Result<Grid> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        generate_with(config, &mut rng)
    }
}

/// Shared generation path, also driven by the game facade's master RNG so
/// a whole run replays from a single seed.
pub(crate) fn generate_with<R: Rng>(config: &GameConfig, rng: &mut R) -> Result<Grid> {
    config.validate()?;

    let (rows, cols) = (config.rows, config.cols);
    let mut blocked: Vec<Coord2> = Vec::new();
    let mut tiles = Array2::from_shape_fn((rows as usize, cols as usize), |(row, col)| {
        if rng.random_bool(config.block_chance) {
            blocked.push((row as Coord, col as Coord));
            Tile::Blocker
        } else {
            Tile::Chain
        }
    });
    log::debug!(
        "generated {}x{} board with {} blocked cells",
        rows,
        cols,
        blocked.len()
    );

    // The bottom row is excluded from sampling, so a single-row board can
    // never host a starting point.
    if rows < 2 {
        return Err(GameError::PlacementUnsatisfiable);
    }

    // A heavily blocked board may have no valid cell at all; a bounded
    // sample count fails fast instead of looping forever.
    let max_attempts = (config.total_cells() as u32).saturating_mul(64);
    for _ in 0..max_attempts {
        let coords = (rng.random_range(0..rows - 1), rng.random_range(0..cols));

        let valid: SmallVec<[Direction; 4]> = Direction::FLOW_PRIORITY
            .into_iter()
            .filter(|&dir| direction_is_valid(dir, coords, (rows, cols), &blocked))
            .collect();
        if valid.is_empty() {
            continue;
        }

        let dir = valid[rng.random_range(0..valid.len())];
        // The sampled cell may itself hold a blocker; whatever occupied it
        // is replaced, so it no longer counts as blocked.
        blocked.retain(|&cell| cell != coords);
        tiles[coords.to_nd_index()] = Tile::start(dir);
        log::debug!("placed starting point at {:?} facing {:?}", coords, dir);
        return Ok(Grid::from_parts(tiles, coords, blocked));
    }

    log::warn!("no valid starting point found after {} samples", max_attempts);
    Err(GameError::PlacementUnsatisfiable)
}

/// A starting direction is valid when the position permits it, the cell
/// directly ahead is not blocked, and the two forward-diagonal cells are
/// not both blocked (which would dead-end the flow immediately).
fn direction_is_valid(dir: Direction, coords: Coord2, bounds: Coord2, blocked: &[Coord2]) -> bool {
    use Direction::*;

    let (row, col) = (coords.0 as isize, coords.1 as isize);
    let cols = bounds.1 as isize;

    let position_ok = match dir {
        Right => col + 1 < cols,
        Left => col > 0,
        Up => row > 0,
        // row < rows - 1 is guaranteed by the sampling range
        Down => true,
    };
    if !position_ok {
        return false;
    }

    let (drow, dcol) = dir.delta();
    let (ahead_row, ahead_col) = (row + drow, col + dcol);
    if is_blocked(blocked, ahead_row, ahead_col) {
        return false;
    }

    // Forward diagonals sit perpendicular to the flow axis.
    let (prow, pcol) = (dcol.abs(), drow.abs());
    !(is_blocked(blocked, ahead_row + prow, ahead_col + pcol)
        && is_blocked(blocked, ahead_row - prow, ahead_col - pcol))
}

fn is_blocked(blocked: &[Coord2], row: isize, col: isize) -> bool {
    let (Ok(row), Ok(col)) = (Coord::try_from(row), Coord::try_from(col)) else {
        return false;
    };
    blocked.contains(&(row, col))
}
