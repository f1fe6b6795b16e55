//! Prompt builders for the reasoning loop
//!
//! Step prompts carry just enough context to resolve one plan step; the
//! general prompt is the full world-state picture used when no plan exists.
//! Both gate ability-generation language on the agent's role.

use crate::core::config::ReasoningConfig;
use crate::core::types::{EntityId, GridPos};
use crate::planner::plan::ActionStep;
use crate::reasoning::state::{AgentRole, AiState};
use crate::world::World;

/// The action lines an agent may answer with, filtered by role
fn action_menu(role: &AgentRole) -> String {
    let mut menu = String::from(
        "Respond with exactly one action line: MOVE <N|S|E|W>, ATTACK <id>, \
         PICKUP <id>, USE_ABILITY <name> [id], LOG <message>, or IDLE.",
    );
    if role.may_generate_abilities {
        menu.push_str(
            " You may also answer GENERATE_ABILITY <description> to request a new capability.",
        );
    }
    menu
}

/// Context-augmented prompt for resolving one plan step
pub fn build_step_prompt(
    agent: EntityId,
    world: &World,
    state: &AiState,
    step: &ActionStep,
    obstacle: Option<GridPos>,
) -> String {
    let name = world.name(agent).unwrap_or("agent");
    let mut prompt = format!(
        "You are {name} ({personality}).\nYour next plan step: {verb}",
        personality = state.personality,
        verb = step.action,
    );
    if let Some(raw) = step.raw() {
        prompt.push(' ');
        prompt.push_str(raw);
    }
    if let Some(coords) = step.coords() {
        prompt.push_str(&format!(" targeting {coords}"));
    }
    prompt.push('\n');

    if step.step_type.as_deref() == Some("deal_with_obstacle") {
        if let Some(coords) = step.coords() {
            prompt.push_str(&format!("An obstacle blocks {coords}.\n"));
        }
    }
    if let Some(obstacle) = obstacle {
        prompt.push_str(&format!(
            "The path to your current goal is blocked at {obstacle}.\n"
        ));
    }

    prompt.push_str(&action_menu(&state.role));
    prompt
}

/// Full world-state prompt for no-plan general reasoning
pub fn build_general_prompt(
    agent: EntityId,
    world: &World,
    state: &AiState,
    config: &ReasoningConfig,
) -> String {
    let name = world.name(agent).unwrap_or("agent");
    let mut prompt = format!(
        "You are {name} ({personality}).\n",
        personality = state.personality
    );

    if let Some(pos) = world.position(agent) {
        prompt.push_str(&format!("You are at {pos}.\n"));
    }

    if state.goals.is_empty() {
        prompt.push_str("You have no goals.\n");
    } else {
        prompt.push_str("Goals:\n");
        for (i, goal) in state.goals.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, goal.kind));
        }
    }

    if let Some(pos) = world.position(agent) {
        let visible = world.query_radius(pos, config.perception_radius, Some(agent));
        if !visible.is_empty() {
            prompt.push_str("You can see:\n");
            for (id, at) in visible {
                let label = world.name(id).unwrap_or("something");
                prompt.push_str(&format!("- {label} (id {id}) at {at}\n"));
            }
        }
    }

    let abilities = world.known_abilities(agent);
    if !abilities.is_empty() {
        prompt.push_str(&format!("Known abilities: {}\n", abilities.join(", ")));
    }

    let recent: Vec<&str> = world
        .recent_events()
        .rev()
        .take(5)
        .map(|e| e.text.as_str())
        .collect();
    if !recent.is_empty() {
        prompt.push_str("Recent events:\n");
        for text in recent.into_iter().rev() {
            prompt.push_str(&format!("- {text}\n"));
        }
    }

    prompt.push_str(&action_menu(&state.role));
    prompt
}
