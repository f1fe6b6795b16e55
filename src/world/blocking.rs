//! Blocked cells for the obstacle predicate
//!
//! HashSet-based blocking for O(1) lookup. Movement and the planner's path
//! scan consult this; nothing here knows about entities.

use ahash::AHashSet;

use crate::core::types::GridPos;

/// Set of blocked grid cells
#[derive(Debug, Clone, Default)]
pub struct BlockedCells {
    cells: AHashSet<(i32, i32)>,
}

impl BlockedCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block a cell at grid coordinates
    pub fn block(&mut self, x: i32, y: i32) {
        self.cells.insert((x, y));
    }

    /// Unblock a cell at grid coordinates
    pub fn unblock(&mut self, x: i32, y: i32) {
        self.cells.remove(&(x, y));
    }

    /// The obstacle predicate: is this cell impassable?
    pub fn is_blocked(&self, pos: GridPos) -> bool {
        self.cells.contains(&(pos.x, pos.y))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_unblock() {
        let mut cells = BlockedCells::new();
        cells.block(2, 1);
        assert!(cells.is_blocked(GridPos::new(2, 1)));
        cells.unblock(2, 1);
        assert!(!cells.is_blocked(GridPos::new(2, 1)));
    }

    #[test]
    fn test_unblocked_by_default() {
        let cells = BlockedCells::new();
        assert!(!cells.is_blocked(GridPos::new(0, 0)));
        assert!(cells.is_empty());
    }
}
