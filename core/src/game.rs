use core::mem;
use rand::prelude::*;

use crate::*;

/// Wires the grid, the tile queue and the flow engine together behind the
/// boundary contracts: clock ticks in, click events in, renderer
/// notifications out. All randomness descends from the one seed, so a
/// run replays bit-identically.
#[derive(Clone, Debug)]
pub struct Game {
    config: GameConfig,
    grid: Grid,
    queue: TileQueue,
    flow: FlowEngine,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let grid = generate_with(&config, &mut rng)?;
        let queue = TileQueue::new(rng.random());
        let flow = FlowEngine::new(&config, &mut rng)?;
        log::debug!(
            "new game: {}x{}, start {:?}, target {}",
            config.rows,
            config.cols,
            grid.start(),
            flow.target_distance()
        );

        Ok(Self {
            config,
            grid,
            queue,
            flow,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn queue(&self) -> &TileQueue {
        &self.queue
    }

    pub fn flow(&self) -> &FlowEngine {
        &self.flow
    }

    /// Input boundary: the player clicked the cell at `(row, col)`. On a
    /// replaceable tile the queue head is placed there and the queue
    /// advances; otherwise the grid is untouched and the error doubles as
    /// the advisory "locked" signal.
    pub fn tile_clicked(&mut self, row: Coord, col: Coord) -> Result<PipeShape> {
        let coords = (row, col);
        let shape = self.queue.peek_head();
        self.grid.replace_tile(coords, shape)?;
        self.queue.advance();

        if let Some(tile) = self.grid.tile_at(coords) {
            self.events.push(GameEvent::tile(coords, tile));
        }
        Ok(shape)
    }

    /// Clock boundary: one frame worth of elapsed time.
    pub fn tick(&mut self, delta_ms: f32) {
        self.flow.tick(&mut self.grid, delta_ms, &mut self.events);
    }

    /// Renderer boundary: takes all notifications accumulated since the
    /// last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        mem::take(&mut self.events)
    }

    /// Discards the grid, queue and flow engine together and rebuilds
    /// them from `seed`. The flow engine holds coordinates into the grid,
    /// so a partial reset is never valid.
    pub fn restart(&mut self, seed: u64) -> Result<()> {
        *self = Self::new(self.config, seed)?;
        Ok(())
    }
}
