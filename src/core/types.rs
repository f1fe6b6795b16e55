//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for entities
///
/// Integer-keyed because the action text protocol addresses entities by
/// number (`ATTACK 7`, `PICKUP 12`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Discrete 2D grid position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells
    pub fn manhattan(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Cells on the straight x-first, then y path from `self` to `to`,
    /// excluding `self` itself but including `to`.
    pub fn manhattan_path(&self, to: &Self) -> Vec<GridPos> {
        let mut path = Vec::new();
        let step_x = (to.x - self.x).signum();
        let mut cur = *self;
        while cur.x != to.x {
            cur.x += step_x;
            path.push(cur);
        }
        let step_y = (to.y - self.y).signum();
        while cur.y != to.y {
            cur.y += step_y;
            path.push(cur);
        }
        path
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(GridPos::new(0, 0).manhattan(&GridPos::new(3, -2)), 5);
        assert_eq!(GridPos::new(2, 2).manhattan(&GridPos::new(2, 2)), 0);
    }

    #[test]
    fn test_manhattan_path_x_first() {
        let path = GridPos::new(0, 0).manhattan_path(&GridPos::new(2, 1));
        assert_eq!(
            path,
            vec![GridPos::new(1, 0), GridPos::new(2, 0), GridPos::new(2, 1)]
        );
    }

    #[test]
    fn test_manhattan_path_same_cell() {
        assert!(GridPos::new(5, 5)
            .manhattan_path(&GridPos::new(5, 5))
            .is_empty());
    }

    #[test]
    fn test_manhattan_path_negative_direction() {
        // Agent at (2,2) walking to an item at (2,0): pure y descent.
        let path = GridPos::new(2, 2).manhattan_path(&GridPos::new(2, 0));
        assert_eq!(path, vec![GridPos::new(2, 1), GridPos::new(2, 0)]);
    }
}
