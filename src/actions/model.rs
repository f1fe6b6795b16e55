//! Typed action variants produced by the parser
//!
//! Immutable value records: created by the parser, consumed exactly once by
//! the action executor, then discarded.

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

/// The closed set of executable actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Step one cell by the given delta
    Move { dx: i32, dy: i32 },
    Attack { target: EntityId },
    Log { message: String },
    Idle,
    /// Ask the ability pipeline to synthesize a new capability
    GenerateAbility { description: String },
    UseAbility {
        name: String,
        target: Option<EntityId>,
    },
    Pickup { item: EntityId },
}

/// Cardinal direction letters accepted by `MOVE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "N" => Some(Direction::North),
            "S" => Some(Direction::South),
            "E" => Some(Direction::East),
            "W" => Some(Direction::West),
            _ => None,
        }
    }

    /// Unit delta in grid coordinates (y grows southward)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_deltas() {
        assert_eq!(Direction::North.delta(), (0, -1));
        assert_eq!(Direction::South.delta(), (0, 1));
        assert_eq!(Direction::East.delta(), (1, 0));
        assert_eq!(Direction::West.delta(), (-1, 0));
    }

    #[test]
    fn test_direction_token_case_insensitive() {
        assert_eq!(Direction::from_token("n"), Some(Direction::North));
        assert_eq!(Direction::from_token("W"), Some(Direction::West));
        assert_eq!(Direction::from_token("NE"), None);
    }
}
