//! FIFO buffer of parsed actions
//!
//! Filled by the reasoning loop, drained once per tick by the action
//! executor. Single-threaded by contract: all mutation happens on the
//! simulation tick thread, so no locking and no capacity bound.

use std::collections::VecDeque;

use crate::actions::model::Action;
use crate::actions::parser;
use crate::core::types::EntityId;

#[derive(Debug, Default)]
pub struct ActionQueue {
    queue: VecDeque<(EntityId, Action)>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` for `actor` and append every resulting action
    pub fn enqueue_raw(&mut self, actor: EntityId, text: &str) {
        for action in parser::parse(actor, text) {
            self.queue.push_back((actor, action));
        }
    }

    /// Remove and return the oldest action
    pub fn pop(&mut self) -> Option<(EntityId, Action)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.enqueue_raw(EntityId(1), "MOVE N");
        queue.enqueue_raw(EntityId(2), "IDLE");
        assert_eq!(
            queue.pop(),
            Some((EntityId(1), Action::Move { dx: 0, dy: -1 }))
        );
        assert_eq!(queue.pop(), Some((EntityId(2), Action::Idle)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_enqueue_raw_parses_log_pair() {
        let mut queue = ActionQueue::new();
        queue.enqueue_raw(EntityId(1), "LOG going east\nMOVE E");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_unparseable_text_enqueues_nothing() {
        let mut queue = ActionQueue::new();
        queue.enqueue_raw(EntityId(1), "dance wildly");
        assert!(queue.is_empty());
    }
}
