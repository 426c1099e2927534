use rand::prelude::*;

use crate::*;

/// Number of pipes visible in the lookahead queue. Every operation leaves
/// the queue at exactly this length.
pub const QUEUE_LEN: usize = 5;

/// Rolling lookahead of the pipes the player will place next. Slot 0 is
/// the head (next to be placed), the last slot is the freshest draw.
#[derive(Clone, Debug)]
pub struct TileQueue {
    slots: [PipeShape; QUEUE_LEN],
    rng: SmallRng,
}

impl TileQueue {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let slots = core::array::from_fn(|_| draw_shape(&mut rng));
        Self { slots, rng }
    }

    /// The pipe that will be placed next. Does not mutate the queue.
    pub fn peek_head(&self) -> PipeShape {
        self.slots[0]
    }

    /// All queued shapes in placement order, for display purposes.
    pub fn slots(&self) -> &[PipeShape] {
        &self.slots
    }

    pub const fn len(&self) -> usize {
        QUEUE_LEN
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Consumes the head: shifts the remaining pipes toward the front,
    /// draws a fresh one at the tail, and returns the pipe that was at
    /// the head. Callers place the peeked head on the grid first and
    /// advance only once that placement succeeded.
    pub fn advance(&mut self) -> PipeShape {
        let head = self.slots[0];
        self.slots.rotate_left(1);
        self.slots[QUEUE_LEN - 1] = draw_shape(&mut self.rng);
        log::trace!("queue advanced, consumed {:?}", head);
        head
    }
}

fn draw_shape<R: Rng>(rng: &mut R) -> PipeShape {
    PipeShape::ALL[rng.random_range(0..PipeShape::ALL.len())]
}
