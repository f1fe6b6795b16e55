//! Fallback behavior tree
//!
//! A minimal Selector/Sequence/Action tree evaluated synchronously in a
//! single pass, with no state carried between ticks. The reasoning loop
//! consults it when the LLM path stalls or is disabled, so the default tree
//! must end in a leaf that always succeeds.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::actions::model::Direction;
use crate::core::types::EntityId;
use crate::world::World;

/// Leaf function: pure decision from agent and world to action text
pub type LeafFn = dyn Fn(EntityId, &World) -> Option<String>;

pub enum Behavior {
    /// Leaf invoking a pure function
    Action(Box<LeafFn>),
    /// All children must succeed; yields the last child's action
    Sequence(Vec<Behavior>),
    /// First non-null child wins
    Selector(Vec<Behavior>),
}

impl Behavior {
    pub fn action(f: impl Fn(EntityId, &World) -> Option<String> + 'static) -> Self {
        Behavior::Action(Box::new(f))
    }

    /// Evaluate the tree once. Terminates on any input: the node set is
    /// finite and there are no cycles by construction.
    pub fn run(&self, agent: EntityId, world: &World) -> Option<String> {
        match self {
            Behavior::Action(f) => f(agent, world),
            Behavior::Sequence(children) => {
                let mut last = None;
                for child in children {
                    match child.run(agent, world) {
                        Some(action) => last = Some(action),
                        None => return None,
                    }
                }
                last
            }
            Behavior::Selector(children) => {
                children.iter().find_map(|child| child.run(agent, world))
            }
        }
    }
}

/// The default fallback: flee an adjacent blocked-in spot if possible,
/// otherwise wander. The wander leaf succeeds unconditionally, so the
/// Selector never returns None.
pub fn default_fallback_tree(seed: u64) -> Behavior {
    Behavior::Selector(vec![
        Behavior::action(move |agent, world| step_toward_open(agent, world, seed)),
        Behavior::action(move |agent, world| Some(wander(agent, world, seed))),
    ])
}

/// Prefer a random unblocked neighbor cell; fails when fully boxed in or
/// the agent has no position
fn step_toward_open(agent: EntityId, world: &World, seed: u64) -> Option<String> {
    let pos = world.position(agent)?;
    let mut rng = tick_rng(agent, world, seed);
    let mut dirs = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];
    dirs.shuffle(&mut rng);
    dirs.iter()
        .find(|dir| {
            let (dx, dy) = dir.delta();
            !world.is_blocked(crate::core::types::GridPos::new(pos.x + dx, pos.y + dy))
        })
        .map(|dir| format!("MOVE {}", dir.letter()))
}

/// Unconditional default movement
fn wander(agent: EntityId, world: &World, seed: u64) -> String {
    let mut rng = tick_rng(agent, world, seed);
    let dirs = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];
    let dir = dirs[rng.gen_range(0..dirs.len())];
    format!("MOVE {}", dir.letter())
}

/// Deterministic per-agent, per-tick rng so replays are stable
fn tick_rng(agent: EntityId, world: &World, seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ agent.0.wrapping_mul(0x9e37_79b9) ^ world.current_tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GridPos;

    #[test]
    fn test_selector_first_non_null_wins() {
        let tree = Behavior::Selector(vec![
            Behavior::action(|_, _| None),
            Behavior::action(|_, _| Some("IDLE".into())),
            Behavior::action(|_, _| Some("MOVE N".into())),
        ]);
        let world = World::new();
        assert_eq!(tree.run(EntityId(1), &world), Some("IDLE".into()));
    }

    #[test]
    fn test_sequence_short_circuits_on_null() {
        let tree = Behavior::Sequence(vec![
            Behavior::action(|_, _| Some("LOG checking".into())),
            Behavior::action(|_, _| None),
            Behavior::action(|_, _| Some("MOVE N".into())),
        ]);
        let world = World::new();
        assert_eq!(tree.run(EntityId(1), &world), None);
    }

    #[test]
    fn test_sequence_yields_last_child() {
        let tree = Behavior::Sequence(vec![
            Behavior::action(|_, _| Some("LOG first".into())),
            Behavior::action(|_, _| Some("MOVE S".into())),
        ]);
        let world = World::new();
        assert_eq!(tree.run(EntityId(1), &world), Some("MOVE S".into()));
    }

    #[test]
    fn test_default_tree_never_returns_none() {
        let mut world = World::new();
        let agent = world.spawn("lost", GridPos::new(0, 0));
        // Box the agent in completely; the wander leaf must still answer.
        for (dx, dy) in [(0, -1), (0, 1), (1, 0), (-1, 0)] {
            world.blocked.block(dx, dy);
        }
        let tree = default_fallback_tree(7);
        for tick in 0..20 {
            world.current_tick = tick;
            let action = tree.run(agent, &world);
            assert!(action.is_some());
            assert!(action.unwrap().starts_with("MOVE "));
        }
    }

    #[test]
    fn test_default_tree_answers_for_positionless_agent() {
        let world = World::new();
        let tree = default_fallback_tree(7);
        assert!(tree.run(EntityId(99), &world).is_some());
    }
}
