use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board rows, columns, and positions.
pub type Coord = u8;

/// Count type used for cell counts and travelled distance.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

bitflags! {
    /// Set of board edges a pipe piece is open through.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DirSet: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

/// One of the four flow directions on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// Fixed candidate enumeration and tie-break order used by the flow
    /// engine when picking the next pipe.
    pub const FLOW_PRIORITY: [Direction; 4] =
        [Direction::Right, Direction::Left, Direction::Up, Direction::Down];

    pub const fn opposite(self) -> Direction {
        use Direction::*;
        match self {
            Right => Left,
            Left => Right,
            Up => Down,
            Down => Up,
        }
    }

    pub const fn flag(self) -> DirSet {
        use Direction::*;
        match self {
            Right => DirSet::RIGHT,
            Left => DirSet::LEFT,
            Up => DirSet::UP,
            Down => DirSet::DOWN,
        }
    }

    /// Row/col displacement of one step in this direction.
    pub const fn delta(self) -> (isize, isize) {
        use Direction::*;
        match self {
            Right => (0, 1),
            Left => (0, -1),
            Up => (-1, 0),
            Down => (1, 0),
        }
    }

    /// Moves `coords` one cell in this direction, returning a value only
    /// while it remains inside `bounds` (rows, cols).
    pub fn step(self, coords: Coord2, bounds: Coord2) -> Option<Coord2> {
        apply_delta(coords, self.delta(), bounds)
    }
}

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
pub(crate) fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (drow, dcol) = delta;
    let (max_row, max_col) = bounds;

    let next_row = row.checked_add_signed(drow.try_into().ok()?)?;
    if next_row >= max_row {
        return None;
    }

    let next_col = col.checked_add_signed(dcol.try_into().ok()?)?;
    if next_col >= max_col {
        return None;
    }

    Some((next_row, next_col))
}
