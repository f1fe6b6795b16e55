//! Goal-list planning through a single LLM request
//!
//! Builds one prompt enumerating the agent's goals, flags a blocking tile
//! on the straight path to the first goal, sends exactly one broker
//! request, and parses the multi-line response into step records. An empty
//! plan means "replan later", never an error.

pub mod plan;

use std::time::Instant;

use tracing::{debug, warn};

use crate::core::config::ReasoningConfig;
use crate::core::types::{EntityId, GridPos};
use crate::llm::broker::LlmBroker;
use crate::llm::pending::PollResult;
use crate::llm::sentinel;
use crate::reasoning::state::{Goal, GoalTarget};
use crate::world::World;

pub use plan::{ActionStep, ParamValue};

/// First blocking tile strictly before `to` on the x-first Manhattan path
pub fn first_obstacle_on_path(world: &World, from: GridPos, to: GridPos) -> Option<GridPos> {
    from.manhattan_path(&to)
        .into_iter()
        .filter(|cell| *cell != to)
        .find(|cell| world.is_blocked(*cell))
}

/// Resolve where a goal points in grid coordinates
pub fn resolve_goal_target(world: &World, goal: &Goal) -> Option<GridPos> {
    match goal.target.as_ref()? {
        GoalTarget::Position(pos) => Some(*pos),
        GoalTarget::Entity(id) => world.position(*id),
    }
}

/// Produce an ordered plan for the agent's goals.
///
/// Sends one request through the broker; a pending id is polled for at most
/// `plan_poll_timeout`. Timeouts and sentinel responses yield an empty plan.
pub fn create_plan(
    agent: EntityId,
    goals: &[Goal],
    world: &World,
    broker: &LlmBroker,
    config: &ReasoningConfig,
) -> Vec<ActionStep> {
    if goals.is_empty() {
        return Vec::new();
    }

    let prompt = build_plan_prompt(agent, goals, world);
    let response = broker.request(&prompt, world.current_tick);

    let text = if sentinel::is_pending(&response) {
        match await_pending(broker, &response, config) {
            Some(text) => text,
            None => return Vec::new(),
        }
    } else {
        response
    };

    if sentinel::is_sentinel(&text) {
        debug!(agent = %agent, sentinel = %text, "planner got non-plan response");
        return Vec::new();
    }

    let steps = plan::parse_plan(&text);
    debug!(agent = %agent, steps = steps.len(), "plan created");
    steps
}

/// Bounded busy-wait on the pending table. A design compromise: this is the
/// one place the simulation thread sleeps, capped by `plan_poll_timeout`.
fn await_pending(broker: &LlmBroker, id: &str, config: &ReasoningConfig) -> Option<String> {
    let deadline = Instant::now() + config.plan_poll_timeout;
    loop {
        match broker.poll(id) {
            PollResult::Ready(text) => return Some(text),
            PollResult::Unknown => return None,
            PollResult::Pending => {
                if Instant::now() >= deadline {
                    warn!(id, "plan request timed out; replanning later");
                    return None;
                }
                std::thread::sleep(config.plan_poll_interval);
            }
        }
    }
}

fn build_plan_prompt(agent: EntityId, goals: &[Goal], world: &World) -> String {
    let name = world.name(agent).unwrap_or("agent");
    let mut prompt = format!("You are {name} planning your next steps.\nGoals:\n");
    for (i, goal) in goals.iter().enumerate() {
        match goal.target.as_ref() {
            Some(GoalTarget::Entity(id)) => {
                let target_name = world.name(*id).unwrap_or("unknown");
                let at = world
                    .position(*id)
                    .map(|p| format!(" at {p}"))
                    .unwrap_or_default();
                prompt.push_str(&format!(
                    "{}. {} -> {} (entity {}){}\n",
                    i + 1,
                    goal.kind,
                    target_name,
                    id,
                    at
                ));
            }
            Some(GoalTarget::Position(pos)) => {
                prompt.push_str(&format!("{}. {} -> {}\n", i + 1, goal.kind, pos));
            }
            None => prompt.push_str(&format!("{}. {}\n", i + 1, goal.kind)),
        }
    }

    if let (Some(pos), Some(target)) = (
        world.position(agent),
        goals.first().and_then(|g| resolve_goal_target(world, g)),
    ) {
        if let Some(obstacle) = first_obstacle_on_path(world, pos, target) {
            prompt.push_str(&format!(
                "Note: the straight path from {pos} to {target} is blocked at {obstacle}. \
                 Include a DEAL_WITH_OBSTACLE {},{} or GENERATE_ABILITY step.\n",
                obstacle.x, obstacle.y
            ));
        }
    }

    prompt.push_str(
        "Respond with one step per line, in order. Known step forms: \
         MOVE_TO <x,y>, DEAL_WITH_OBSTACLE <x,y>, GENERATE_ABILITY \"<description>\", \
         or any single-verb step.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::state::Goal;

    fn world_with_obstacle() -> (World, EntityId, EntityId) {
        let mut world = World::new();
        let agent = world.spawn("scout", GridPos::new(2, 2));
        let item = world.spawn_item("relic", GridPos::new(2, 0));
        world.blocked.block(2, 1);
        (world, agent, item)
    }

    #[test]
    fn test_first_obstacle_found_before_target() {
        let (world, agent, item) = world_with_obstacle();
        let from = world.position(agent).unwrap();
        let to = world.position(item).unwrap();
        assert_eq!(
            first_obstacle_on_path(&world, from, to),
            Some(GridPos::new(2, 1))
        );
    }

    #[test]
    fn test_blocked_target_cell_does_not_count() {
        let mut world = World::new();
        let _ = world.spawn("scout", GridPos::new(0, 0));
        world.blocked.block(1, 0);
        // Obstacle on the target itself is not "before the target".
        assert_eq!(
            first_obstacle_on_path(&world, GridPos::new(0, 0), GridPos::new(1, 0)),
            None
        );
    }

    #[test]
    fn test_plan_prompt_mentions_obstacle() {
        let (world, agent, item) = world_with_obstacle();
        let goals = vec![Goal::with_target("fetch", GoalTarget::Entity(item))];
        let prompt = build_plan_prompt(agent, &goals, &world);
        assert!(prompt.contains("blocked at (2,1)"));
        assert!(prompt.contains("DEAL_WITH_OBSTACLE 2,1"));
    }

    #[test]
    fn test_create_plan_empty_on_offline_broker() {
        let (world, agent, item) = world_with_obstacle();
        let goals = vec![Goal::with_target("fetch", GoalTarget::Entity(item))];
        let broker = LlmBroker::offline();
        let config = ReasoningConfig::default();
        assert!(create_plan(agent, &goals, &world, &broker, &config).is_empty());
    }

    #[test]
    fn test_create_plan_empty_without_goals() {
        let (world, agent, _) = world_with_obstacle();
        let broker = LlmBroker::echo();
        let config = ReasoningConfig::default();
        assert!(create_plan(agent, &[], &world, &broker, &config).is_empty());
    }

    #[test]
    fn test_create_plan_parses_cached_live_response() {
        let (world, agent, item) = world_with_obstacle();
        let goals = vec![Goal::with_target("fetch", GoalTarget::Entity(item))];
        let config = ReasoningConfig::default();
        let broker = LlmBroker::live(&config);
        let prompt = build_plan_prompt(agent, &goals, &world);
        broker.prime_cache(&prompt, "DEAL_WITH_OBSTACLE 2,1\nMOVE_TO 2,0\nPICKUP 2");

        let steps = create_plan(agent, &goals, &world, &broker, &config);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].step_type.as_deref(), Some("deal_with_obstacle"));
        assert_eq!(steps[0].coords(), Some(GridPos::new(2, 1)));
        assert_eq!(steps[1].step_type.as_deref(), Some("move_to"));
    }
}
