//! Agent World - Entry Point
//!
//! Runs a small demonstration world for a fixed number of ticks, applying
//! movement and pickup actions and printing everything the agents decide.
//! With LLM_API_KEY set the broker goes live and a real model drives the
//! agents; without it the broker stays offline and the agents act through
//! the deterministic fallback tree.

use agent_world::actions::Action;
use agent_world::core::config::ReasoningConfig;
use agent_world::core::error::Result;
use agent_world::core::types::{EntityId, GridPos};
use agent_world::llm::audit::AuditLog;
use agent_world::llm::{LlmBroker, LlmClient};
use agent_world::reasoning::{AiState, Goal, GoalTarget, ReasoningSystem};
use agent_world::world::World;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_world=debug".into()),
        )
        .init();

    tracing::info!("Agent World starting...");

    let config = ReasoningConfig {
        // Brisk pacing so a 30-tick run shows several decisions per agent.
        llm_cooldown_ticks: 2,
        ..ReasoningConfig::default()
    };
    config.validate()?;

    let mut world = World::with_event_buffer(config.event_buffer);
    let relic = world.spawn_item("relic", GridPos::new(2, 0));
    world.blocked.block(2, 1);

    let scout = world.spawn("scout", GridPos::new(2, 2));
    let mut scout_ai = AiState::new("curious");
    scout_ai.push_goal(Goal::with_target("fetch the relic", GoalTarget::Entity(relic)));
    world.add_ai(scout, scout_ai);

    let wanderer = world.spawn("wanderer", GridPos::new(5, 5));
    world.add_ai(wanderer, AiState::new("restless"));

    let broker = match LlmClient::from_env() {
        Some(client) => {
            let mut broker = LlmBroker::live(&config);
            let audit = AuditLog::new("llm_audit.jsonl", config.audit_rotate_bytes);
            broker.start(client, audit, &config);
            broker
        }
        None => {
            tracing::info!("LLM_API_KEY not set; running offline with fallback behavior");
            LlmBroker::offline()
        }
    };
    let mut reasoning = ReasoningSystem::new(config, broker);

    for _ in 0..30 {
        world.tick();
        reasoning.update(&mut world);

        while let Some((actor, action)) = reasoning.pop_action() {
            execute(&mut world, actor, &action);
            let name = world.name(actor).unwrap_or("?").to_string();
            println!("tick {:>3}  {name}: {action:?}", world.current_tick);
        }
    }

    println!("final scout position: {:?}", world.position(scout));
    println!("entities remaining: {}", world.entity_count());
    Ok(())
}

/// Minimal stand-in for the external action executor: applies movement and
/// pickups, flags failed moves, ignores the rest.
fn execute(world: &mut World, actor: EntityId, action: &Action) {
    match action {
        Action::Move { dx, dy } => {
            let Some(pos) = world.position(actor) else {
                return;
            };
            let next = GridPos::new(pos.x + dx, pos.y + dy);
            if world.is_blocked(next) {
                if let Some(state) = world.ai_mut(actor) {
                    state.last_action_failed = true;
                }
                world.push_event(format!("movement blocked at {next}"));
            } else {
                world.set_position(actor, next);
            }
        }
        Action::Pickup { item } => {
            let adjacent = match (world.position(actor), world.position(*item)) {
                (Some(a), Some(b)) => a.manhattan(&b) <= 1,
                _ => false,
            };
            if world.is_item(*item) && adjacent {
                let label = world.name(*item).unwrap_or("item").to_string();
                world.despawn(*item);
                world.push_event(format!("{label} was picked up"));
            } else if let Some(state) = world.ai_mut(actor) {
                state.last_action_failed = true;
            }
        }
        _ => {}
    }
}
