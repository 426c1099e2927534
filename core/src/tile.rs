use serde::{Deserialize, Serialize};

use crate::*;

/// The seven playable pipe variants and their open edges. This is the
/// catalog consulted by the generator, the queue, and connectivity checks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipeShape {
    Horizontal,
    Vertical,
    TJunction,
    ElbowUpRight,
    ElbowUpLeft,
    ElbowDownRight,
    ElbowDownLeft,
}

impl PipeShape {
    pub const ALL: [PipeShape; 7] = [
        PipeShape::Horizontal,
        PipeShape::Vertical,
        PipeShape::TJunction,
        PipeShape::ElbowUpRight,
        PipeShape::ElbowUpLeft,
        PipeShape::ElbowDownRight,
        PipeShape::ElbowDownLeft,
    ];

    pub const fn directions(self) -> DirSet {
        use PipeShape::*;
        match self {
            Horizontal => DirSet::LEFT.union(DirSet::RIGHT),
            Vertical => DirSet::UP.union(DirSet::DOWN),
            TJunction => DirSet::all(),
            ElbowUpRight => DirSet::UP.union(DirSet::RIGHT),
            ElbowUpLeft => DirSet::UP.union(DirSet::LEFT),
            ElbowDownRight => DirSet::DOWN.union(DirSet::RIGHT),
            ElbowDownLeft => DirSet::DOWN.union(DirSet::LEFT),
        }
    }
}

/// Flow-time state carried by every pipe-bearing tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeState {
    pub open: DirSet,
    pub filled: bool,
    pub flowing: bool,
}

impl PipeState {
    pub const fn new(open: DirSet) -> Self {
        Self {
            open,
            filled: false,
            flowing: false,
        }
    }
}

/// A single board cell. Tile *type* only ever changes through the grid's
/// replacement path; fill/flow status only through the flow engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    /// Placeholder the player may replace with a pipe.
    Chain,
    /// Permanently blocked, never replaceable, never part of the flow.
    Blocker,
    /// Playable pipe piece.
    Pipe(PipeState),
    /// Flow origin: a locked pipe with exactly one open direction.
    Start(PipeState),
}

impl Tile {
    pub fn pipe(shape: PipeShape) -> Tile {
        Tile::Pipe(PipeState::new(shape.directions()))
    }

    pub fn start(dir: Direction) -> Tile {
        Tile::Start(PipeState::new(dir.flag()))
    }

    pub const fn kind(&self) -> TileKind {
        match self {
            Tile::Chain => TileKind::Chain,
            Tile::Blocker => TileKind::Blocker,
            Tile::Pipe(_) => TileKind::Pipe,
            Tile::Start(_) => TileKind::Start,
        }
    }

    /// Flow-capable state of this tile, if it carries one.
    pub const fn flow_state(&self) -> Option<&PipeState> {
        match self {
            Tile::Pipe(state) | Tile::Start(state) => Some(state),
            Tile::Chain | Tile::Blocker => None,
        }
    }

    pub(crate) const fn flow_state_mut(&mut self) -> Option<&mut PipeState> {
        match self {
            Tile::Pipe(state) | Tile::Start(state) => Some(state),
            Tile::Chain | Tile::Blocker => None,
        }
    }

    /// Whether the player may swap this tile for a queued pipe. The check
    /// dispatches on the kind tag alone; blockers and starting points are
    /// locked for the grid's lifetime, pipes lock once water reaches them.
    pub const fn is_replaceable(&self) -> bool {
        match self {
            Tile::Chain => true,
            Tile::Pipe(state) => !state.filled && !state.flowing,
            Tile::Blocker | Tile::Start(_) => false,
        }
    }
}

/// Kind tag reported in renderer notifications.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Chain,
    Blocker,
    Pipe,
    Start,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_opens_at_least_two_edges() {
        for shape in PipeShape::ALL {
            assert!(shape.directions().bits().count_ones() >= 2, "{shape:?}");
        }
    }

    #[test]
    fn elbows_open_adjacent_edges() {
        assert_eq!(
            PipeShape::ElbowUpRight.directions(),
            DirSet::UP | DirSet::RIGHT
        );
        assert_eq!(
            PipeShape::ElbowDownLeft.directions(),
            DirSet::DOWN | DirSet::LEFT
        );
    }

    #[test]
    fn start_tiles_open_exactly_one_edge() {
        for dir in Direction::FLOW_PRIORITY {
            let tile = Tile::start(dir);
            let state = tile.flow_state().unwrap();
            assert_eq!(state.open.bits().count_ones(), 1);
            assert!(state.open.contains(dir.flag()));
        }
    }

    #[test]
    fn replaceability_follows_the_kind_tag() {
        assert!(Tile::Chain.is_replaceable());
        assert!(Tile::pipe(PipeShape::Vertical).is_replaceable());
        assert!(!Tile::Blocker.is_replaceable());
        assert!(!Tile::start(Direction::Right).is_replaceable());

        let mut flowing = Tile::pipe(PipeShape::Horizontal);
        flowing.flow_state_mut().unwrap().flowing = true;
        assert!(!flowing.is_replaceable());

        let mut filled = Tile::pipe(PipeShape::Horizontal);
        filled.flow_state_mut().unwrap().filled = true;
        assert!(!filled.is_replaceable());
    }
}
