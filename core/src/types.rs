//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// One engine invocation. Sixteen ticks make one simulated week.
pub type Tick = u64;

/// The canonical run identifier.
pub type RunId = String;

/// Raw cell value: tile id in the low bits plus flag bits.
pub type Cell = u16;

/// A tile coordinate on the full-resolution grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring position one step in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Compass directions in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    pub fn from_index(i: u32) -> Self {
        Self::ALL[(i & 3) as usize]
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    pub fn reverse(self) -> Self {
        Self::from_index(self as u32 + 2)
    }
}
