use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::*;

/// Recursion cutoff for the reachability lookahead.
pub const LOOKAHEAD_DEPTH: u8 = 5;

/// Valid transitions:
/// - Previewing -> Flowing (countdown expiry, exactly once)
/// - Flowing -> Won
/// - Flowing -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    /// Countdown running; the player is still laying pipes.
    Previewing,
    /// Water is traversing the network one segment at a time.
    Flowing,
    /// Target distance reached.
    Won,
    /// No connected, unfilled pipe left before the target.
    Lost,
}

impl FlowStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Tick-driven state machine for the countdown and the water flow. Reads
/// the grid for connectivity and is the sole mutator of tile fill/flow
/// status; tile types are never touched from here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEngine {
    status: FlowStatus,
    current: Option<Coord2>,
    fill_progress: f32,
    distance: CellCount,
    target: CellCount,
    countdown_ms: f32,
    fill_seconds: f32,
}

impl FlowEngine {
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let target = rng.random_range(config.min_target..=config.max_target);
        log::debug!("target distance drawn: {}", target);
        Ok(Self {
            status: FlowStatus::Previewing,
            current: None,
            fill_progress: 0.0,
            distance: 0,
            target,
            countdown_ms: config.countdown_ms,
            fill_seconds: config.fill_seconds,
        })
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Tile water is currently filling, while the flow is active.
    pub fn current_tile(&self) -> Option<Coord2> {
        self.current
    }

    /// Normalized fill timer of the current tile.
    pub fn fill_progress(&self) -> f32 {
        self.fill_progress.min(1.0)
    }

    /// Pipes traversed beyond the starting point.
    pub fn distance_travelled(&self) -> CellCount {
        self.distance
    }

    pub fn target_distance(&self) -> CellCount {
        self.target
    }

    /// Milliseconds left before the flow starts; 0 once it has.
    pub fn countdown_remaining_ms(&self) -> f32 {
        self.countdown_ms.max(0.0)
    }

    /// Advances the machine by one clock tick. Terminal states ignore
    /// further ticks. At most one pipe segment completes per tick.
    pub fn tick(&mut self, grid: &mut Grid, delta_ms: f32, events: &mut Vec<GameEvent>) {
        match self.status {
            FlowStatus::Previewing => {
                self.countdown_ms -= delta_ms;
                if self.countdown_ms <= 0.0 {
                    self.countdown_ms = 0.0;
                    self.begin_flow(grid, events);
                }
            }
            FlowStatus::Flowing => self.advance_flow(grid, delta_ms, events),
            FlowStatus::Won | FlowStatus::Lost => {}
        }
    }

    fn begin_flow(&mut self, grid: &mut Grid, events: &mut Vec<GameEvent>) {
        self.status = FlowStatus::Flowing;
        self.current = Some(grid.start());
        self.fill_progress = 0.0;
        // No replacements may race an active flow.
        grid.mark_game_over();
        log::debug!("countdown expired, flow starts at {:?}", grid.start());
        events.push(GameEvent::flow(self));
    }

    fn advance_flow(&mut self, grid: &mut Grid, delta_ms: f32, events: &mut Vec<GameEvent>) {
        let Some(current) = self.current else { return };

        if grid.set_flowing(current)
            && let Some(tile) = grid.tile_at(current)
        {
            events.push(GameEvent::tile(current, tile));
        }

        self.fill_progress += delta_ms / 1000.0 / self.fill_seconds;
        if self.fill_progress < 1.0 {
            return;
        }

        if grid.set_filled(current)
            && let Some(tile) = grid.tile_at(current)
        {
            events.push(GameEvent::tile(current, tile));
        }

        // The starting point is the flow origin, not a traversed pipe.
        if !matches!(grid.tile_at(current), Some(Tile::Start(_))) {
            self.distance += 1;
        }

        if self.distance >= self.target {
            log::debug!("target distance {} reached", self.target);
            self.finish(FlowStatus::Won, events);
            return;
        }

        match self.find_next(grid) {
            Some(next) => {
                log::trace!("flow advances {:?} -> {:?}", current, next);
                self.current = Some(next);
                self.fill_progress = 0.0;
                events.push(GameEvent::flow(self));
            }
            None => {
                log::debug!("no connected pipe after {:?}, flow stops", current);
                self.finish(FlowStatus::Lost, events);
            }
        }
    }

    fn finish(&mut self, status: FlowStatus, events: &mut Vec<GameEvent>) {
        self.status = status;
        self.current = None;
        self.fill_progress = 0.0;
        events.push(GameEvent::flow(self));
    }

    /// Picks the next tile among the connectable, unfilled neighbors of
    /// the current one, preferring the highest reachability score. Ties
    /// keep the earlier candidate in right/left/up/down order. Advisory
    /// only: a locally better branch may still dead-end later.
    fn find_next(&self, grid: &Grid) -> Option<Coord2> {
        let current = self.current?;
        let from = grid.tile_at(current)?.flow_state()?.open;
        let bounds = grid.size();

        let mut best: Option<(Coord2, u32)> = None;
        for dir in Direction::FLOW_PRIORITY {
            let Some(next) = dir.step(current, bounds) else {
                continue;
            };
            let Some(state) = grid.tile_at(next).and_then(Tile::flow_state) else {
                continue;
            };
            if state.filled || !can_connect(from, state.open, dir) {
                continue;
            }

            let mut visited = HashSet::new();
            let score = reach_score(grid, next, &mut visited, 0);
            log::trace!("candidate {:?} via {:?} scores {}", next, dir, score);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((next, score));
            }
        }

        best.map(|(coords, _)| coords)
    }
}

/// Number of distinct unfilled pipes reachable from `coords`, exploring
/// at most `LOOKAHEAD_DEPTH` connections deep and never revisiting a tile
/// within one exploration.
fn reach_score(grid: &Grid, coords: Coord2, visited: &mut HashSet<Coord2>, depth: u8) -> u32 {
    if depth >= LOOKAHEAD_DEPTH || !visited.insert(coords) {
        return 0;
    }
    let Some(state) = grid.tile_at(coords).and_then(Tile::flow_state) else {
        return 0;
    };

    let mut score = 1;
    for dir in Direction::FLOW_PRIORITY {
        let Some(next) = dir.step(coords, grid.size()) else {
            continue;
        };
        if visited.contains(&next) {
            continue;
        }
        let Some(next_state) = grid.tile_at(next).and_then(Tile::flow_state) else {
            continue;
        };
        if next_state.filled || !can_connect(state.open, next_state.open, dir) {
            continue;
        }
        score += reach_score(grid, next, visited, depth + 1);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn engine(target: CellCount, countdown_ms: f32) -> FlowEngine {
        let config = GameConfig {
            min_target: target,
            max_target: target,
            countdown_ms,
            ..GameConfig::default()
        };
        FlowEngine::new(&config, &mut SmallRng::seed_from_u64(0)).unwrap()
    }

    fn grid_from(rows: usize, cols: usize, tiles: Vec<Tile>, start: Coord2) -> Grid {
        let tiles = Array2::from_shape_vec((rows, cols), tiles).unwrap();
        Grid::from_tiles(tiles, start).unwrap()
    }

    /// One 2-second fill step at the default fill rate.
    fn fill_step(engine: &mut FlowEngine, grid: &mut Grid, events: &mut Vec<GameEvent>) {
        engine.tick(grid, 2000.0, events);
    }

    #[test]
    fn countdown_expiry_starts_the_flow_and_locks_the_grid() {
        let mut grid = grid_from(
            2,
            1,
            vec![Tile::start(Direction::Down), Tile::Chain],
            (0, 0),
        );
        let mut engine = engine(10, 15_000.0);
        let mut events = Vec::new();

        engine.tick(&mut grid, 10_000.0, &mut events);
        assert_eq!(engine.status(), FlowStatus::Previewing);
        assert!(!grid.is_game_over());
        assert_eq!(engine.countdown_remaining_ms(), 5_000.0);

        engine.tick(&mut grid, 5_000.0, &mut events);
        assert_eq!(engine.status(), FlowStatus::Flowing);
        assert_eq!(engine.current_tile(), Some((0, 0)));
        assert!(grid.is_game_over());
        assert!(events.contains(&GameEvent::Flow {
            status: FlowStatus::Flowing,
            distance: 0,
            target: 10,
        }));
    }

    #[test]
    fn disconnected_network_loses_after_one_pipe() {
        // StartingPoint(right), horizontal, then a vertical that has no
        // left edge: the flow fills one pipe and stops.
        let mut grid = grid_from(
            1,
            3,
            vec![
                Tile::start(Direction::Right),
                Tile::pipe(PipeShape::Horizontal),
                Tile::pipe(PipeShape::Vertical),
            ],
            (0, 0),
        );
        let mut engine = engine(10, 1_000.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 1_000.0, &mut events);

        // start tile fills, flow moves to the horizontal pipe
        fill_step(&mut engine, &mut grid, &mut events);
        assert_eq!(engine.status(), FlowStatus::Flowing);
        assert_eq!(engine.current_tile(), Some((0, 1)));
        assert_eq!(engine.distance_travelled(), 0);

        // the horizontal pipe fills, nothing connects to the right
        fill_step(&mut engine, &mut grid, &mut events);
        assert_eq!(engine.status(), FlowStatus::Lost);
        assert_eq!(engine.distance_travelled(), 1);
        assert!(events.contains(&GameEvent::Flow {
            status: FlowStatus::Lost,
            distance: 1,
            target: 10,
        }));
    }

    #[test]
    fn flow_wins_at_target_distance() {
        let mut grid = grid_from(
            1,
            3,
            vec![
                Tile::start(Direction::Right),
                Tile::pipe(PipeShape::Horizontal),
                Tile::pipe(PipeShape::Horizontal),
            ],
            (0, 0),
        );
        let mut engine = engine(2, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        fill_step(&mut engine, &mut grid, &mut events); // start
        fill_step(&mut engine, &mut grid, &mut events); // (0,1)
        fill_step(&mut engine, &mut grid, &mut events); // (0,2)

        assert_eq!(engine.status(), FlowStatus::Won);
        assert_eq!(engine.distance_travelled(), 2);
        assert!(grid.tile_at((0, 2)).unwrap().flow_state().unwrap().filled);
    }

    #[test]
    fn terminal_states_ignore_further_ticks() {
        let mut grid = grid_from(
            2,
            1,
            vec![Tile::start(Direction::Down), Tile::pipe(PipeShape::Vertical)],
            (0, 0),
        );
        let mut engine = engine(1, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);
        fill_step(&mut engine, &mut grid, &mut events);
        fill_step(&mut engine, &mut grid, &mut events);
        assert_eq!(engine.status(), FlowStatus::Won);

        events.clear();
        let snapshot = engine.clone();
        fill_step(&mut engine, &mut grid, &mut events);
        assert_eq!(engine, snapshot);
        assert!(events.is_empty());
    }

    #[test]
    fn filling_marks_flowing_then_filled() {
        let mut grid = grid_from(
            2,
            1,
            vec![Tile::start(Direction::Down), Tile::pipe(PipeShape::Vertical)],
            (0, 0),
        );
        let mut engine = engine(10, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        engine.tick(&mut grid, 500.0, &mut events);
        let start_state = grid.tile_at((0, 0)).unwrap().flow_state().unwrap();
        assert!(start_state.flowing);
        assert!(!start_state.filled);
        assert!(engine.fill_progress() > 0.0);

        engine.tick(&mut grid, 1_500.0, &mut events);
        let start_state = grid.tile_at((0, 0)).unwrap().flow_state().unwrap();
        assert!(!start_state.flowing);
        assert!(start_state.filled);
    }

    #[test]
    fn equal_scores_break_ties_in_priority_order() {
        // A junction below the start with identical dead-end pipes left
        // and right: the right one wins the tie.
        let mut grid = grid_from(
            3,
            3,
            vec![
                Tile::Chain,
                Tile::start(Direction::Down),
                Tile::Chain,
                Tile::pipe(PipeShape::Horizontal),
                Tile::pipe(PipeShape::TJunction),
                Tile::pipe(PipeShape::Horizontal),
                Tile::Chain,
                Tile::Chain,
                Tile::Chain,
            ],
            (0, 1),
        );
        let mut engine = engine(10, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        fill_step(&mut engine, &mut grid, &mut events); // start
        assert_eq!(engine.current_tile(), Some((1, 1)));
        fill_step(&mut engine, &mut grid, &mut events); // junction
        assert_eq!(engine.current_tile(), Some((1, 2)));
    }

    #[test]
    fn lookahead_prefers_the_longer_branch() {
        // Left of the junction lies a two-pipe run, right a single
        // dead-end: the score overrides the right-first priority.
        let mut grid = grid_from(
            2,
            5,
            vec![
                Tile::Chain,
                Tile::Chain,
                Tile::start(Direction::Down),
                Tile::Chain,
                Tile::Chain,
                Tile::pipe(PipeShape::Horizontal),
                Tile::pipe(PipeShape::Horizontal),
                Tile::pipe(PipeShape::TJunction),
                Tile::pipe(PipeShape::Horizontal),
                Tile::Chain,
            ],
            (0, 2),
        );
        let mut engine = engine(10, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        fill_step(&mut engine, &mut grid, &mut events); // start
        assert_eq!(engine.current_tile(), Some((1, 2)));
        fill_step(&mut engine, &mut grid, &mut events); // junction
        assert_eq!(engine.current_tile(), Some((1, 1)));
    }

    #[test]
    fn lookahead_depth_caps_long_branches() {
        // Both branches exceed the lookahead horizon, so their scores
        // saturate equally and priority decides again.
        let cols = 15;
        let mut tiles = vec![Tile::Chain; cols * 2];
        tiles[7] = Tile::start(Direction::Down);
        for col in 0..cols {
            tiles[cols + col] = Tile::pipe(PipeShape::Horizontal);
        }
        tiles[cols + 7] = Tile::pipe(PipeShape::TJunction);
        let mut grid = grid_from(2, cols, tiles, (0, 7));
        let mut engine = engine(20, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        fill_step(&mut engine, &mut grid, &mut events); // start
        fill_step(&mut engine, &mut grid, &mut events); // junction

        assert_eq!(engine.current_tile(), Some((1, 8)));
    }

    #[test]
    fn start_with_no_neighbor_loses_immediately_after_filling() {
        let mut grid = grid_from(
            2,
            1,
            vec![Tile::start(Direction::Down), Tile::Chain],
            (0, 0),
        );
        let mut engine = engine(10, 0.0);
        let mut events = Vec::new();
        engine.tick(&mut grid, 0.0, &mut events);

        fill_step(&mut engine, &mut grid, &mut events);

        assert_eq!(engine.status(), FlowStatus::Lost);
        assert_eq!(engine.distance_travelled(), 0);
    }

    #[test]
    fn target_is_always_inside_the_configured_range() {
        let config = GameConfig::default();
        for seed in 0..1000 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let engine = FlowEngine::new(&config, &mut rng).unwrap();
            assert!((15..=20).contains(&engine.target_distance()));
        }
    }
}
