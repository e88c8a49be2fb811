//! World directions and block facing.
//!
//! Direction indices are stable (0..=5) because persistence and network
//! encodings store them as raw bytes; the order matches the usual
//! down/up/north/south/west/east convention.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the six axis-aligned world directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Negative Y.
    Down = 0,
    /// Positive Y.
    Up = 1,
    /// Negative Z.
    North = 2,
    /// Positive Z.
    South = 3,
    /// Negative X.
    West = 4,
    /// Positive X.
    East = 5,
}

/// Error raised when a raw value does not name a usable direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DirectionError {
    /// Raw index outside 0..=5.
    #[error("direction index {0} out of range")]
    BadIndex(u8),
    /// A vertical direction where only horizontal ones are allowed.
    #[error("{0:?} is not a horizontal direction")]
    NotHorizontal(Direction),
}

impl Direction {
    /// All six directions in stable index order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Stable numeric index of this direction.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from the stable numeric index.
    pub const fn from_index(index: usize) -> Option<Direction> {
        match index {
            0 => Some(Direction::Down),
            1 => Some(Direction::Up),
            2 => Some(Direction::North),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            5 => Some(Direction::East),
            _ => None,
        }
    }

    /// Whether this direction lies in the horizontal plane.
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Direction::Down | Direction::Up)
    }

    /// The direction pointing the opposite way.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Canonical string key used in configs/logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = DirectionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Direction::from_index(value as usize).ok_or(DirectionError::BadIndex(value))
    }
}

/// A horizontal-only block facing.
///
/// Storage blocks face one of the four horizontal directions; vertical
/// facings are rejected at every construction site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Direction", into = "Direction")]
pub struct Facing(Direction);

impl Facing {
    /// Default facing for freshly placed blocks.
    pub const DEFAULT: Facing = Facing(Direction::South);

    /// Construct a facing, rejecting vertical directions.
    pub fn new(direction: Direction) -> Result<Facing, DirectionError> {
        if direction.is_horizontal() {
            Ok(Facing(direction))
        } else {
            Err(DirectionError::NotHorizontal(direction))
        }
    }

    /// The underlying direction.
    pub const fn direction(self) -> Direction {
        self.0
    }

    /// Rotate one step through the four horizontal directions.
    pub const fn rotate_left(self) -> Facing {
        Facing(match self.0 {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
            // Unreachable for a constructed Facing.
            other => other,
        })
    }
}

impl Default for Facing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<Direction> for Facing {
    type Error = DirectionError;

    fn try_from(direction: Direction) -> Result<Self, Self::Error> {
        Facing::new(direction)
    }
}

impl From<Facing> for Direction {
    fn from(facing: Facing) -> Direction {
        facing.direction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_indices_are_stable() {
        for (index, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), index);
            assert_eq!(Direction::from_index(index), Some(*dir));
        }
        assert_eq!(Direction::from_index(6), None);
    }

    #[test]
    fn opposites_pair_up() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn facing_rejects_vertical() {
        assert!(Facing::new(Direction::Up).is_err());
        assert!(Facing::new(Direction::Down).is_err());
        assert!(Facing::new(Direction::North).is_ok());
    }

    #[test]
    fn facing_rotation_cycles_four_ways() {
        let mut facing = Facing::DEFAULT;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(facing.direction());
            facing = facing.rotate_left();
        }
        assert_eq!(facing, Facing::DEFAULT);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }
}
