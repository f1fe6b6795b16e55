//! Per-tick reasoning state machine
//!
//! Runs once per tick over every AI-controlled entity and decides whether
//! to execute a plan step directly, ask the LLM, poll an outstanding
//! request, replan, or fall back to the behavior tree. The branching exists
//! to minimize LLM calls, guarantee an action path every eligible tick, and
//! keep LLM latency invisible to the tick loop.

use tracing::{debug, info, warn};

use crate::actions::model::Action;
use crate::actions::parser;
use crate::actions::queue::ActionQueue;
use crate::behavior::tree::{default_fallback_tree, Behavior};
use crate::core::config::ReasoningConfig;
use crate::core::types::{EntityId, GridPos, Tick};
use crate::llm::broker::LlmBroker;
use crate::llm::pending::PollResult;
use crate::llm::sentinel;
use crate::planner;
use crate::planner::plan::ActionStep;
use crate::reasoning::prompts;
use crate::reasoning::state::{AgentRole, AiState};
use crate::world::World;

/// Outcome of one LLM interaction attempt within a tick
enum Decision {
    /// Action text decided this tick
    Act(String),
    /// A request is in flight; the agent's tick ends here
    Wait,
    /// No actionable text; cooldown recorded, fallback may still act
    Failed,
}

pub struct ReasoningSystem {
    config: ReasoningConfig,
    broker: LlmBroker,
    queue: ActionQueue,
    fallback: Behavior,
}

impl ReasoningSystem {
    pub fn new(config: ReasoningConfig, broker: LlmBroker) -> Self {
        Self {
            fallback: default_fallback_tree(0),
            config,
            broker,
            queue: ActionQueue::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: Behavior) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn broker(&self) -> &LlmBroker {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut LlmBroker {
        &mut self.broker
    }

    /// Consumed once per tick by the action executor
    pub fn pop_action(&mut self) -> Option<(EntityId, Action)> {
        self.queue.pop()
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Per-tick entry point invoked by the system scheduler
    pub fn update(&mut self, world: &mut World) {
        let tick = world.current_tick;
        for agent in world.agent_ids() {
            self.update_agent(world, agent, tick);
        }
    }

    fn update_agent(&mut self, world: &mut World, agent: EntityId, tick: Tick) {
        let Some(mut state) = world.take_ai(agent) else {
            return;
        };
        if let Some(text) = self.drive(world, agent, &mut state, tick) {
            let text = contextualize_generation(world, agent, &state, text);
            debug!(agent = %agent, tick, action = %text, "action decided");
            self.queue.enqueue_raw(agent, &text);
            state.last_llm_action_tick = Some(tick);
        }
        world.add_ai(agent, state);
    }

    /// The state machine proper. Returns the decided action text, or None
    /// when the agent takes no action this tick (skipped, pending, or
    /// failed with cooldown recorded).
    fn drive(
        &mut self,
        world: &World,
        agent: EntityId,
        state: &mut AiState,
        tick: Tick,
    ) -> Option<String> {
        // 1. Blocked on an externally generated capability.
        if state.waiting_for_ability {
            debug!(agent = %agent, tick, "waiting on ability generation");
            return None;
        }

        // 2. Failure bookkeeping from the previous tick's execution.
        if state.last_action_failed {
            state.last_action_failed = false;
            bump_front_retry(state, tick, self.config.max_plan_step_retries);
        }

        // 3. A freshly available capability beats everything else.
        if let Some(name) = state.ability_hint.take() {
            info!(agent = %agent, ability = %name, "using newly generated ability");
            return Some(format!("USE_ABILITY {name}"));
        }

        // 4. Plan bootstrap, at most one planning request per tick.
        if state.role.llm_enabled
            && !state.goals.is_empty()
            && state.current_plan.is_empty()
            && state.last_plan_generation_tick != Some(tick)
        {
            state.last_plan_generation_tick = Some(tick);
            let steps =
                planner::create_plan(agent, &state.goals, world, &self.broker, &self.config);
            state.current_plan = steps.into();
        }

        // 5. Cooldown gate; the rethink flag bypasses it exactly once.
        if state.needs_immediate_rethink {
            state.needs_immediate_rethink = false;
            debug!(agent = %agent, tick, "immediate rethink override");
        } else if let Some(last) = state.last_llm_action_tick {
            if tick.saturating_sub(last) < self.config.llm_cooldown_ticks {
                return None;
            }
        }

        // 6. Plan-step execution.
        if let Some(step) = state.current_plan.front().cloned() {
            if let Some(text) = direct_step_conversion(&step, agent, world, &state.role) {
                debug!(agent = %agent, step = %step.action, "direct step conversion");
                state.current_plan.pop_front();
                state.general_action_retries = 0;
                return Some(text);
            }
            if state.role.llm_enabled {
                match self.resolve_step_via_llm(world, agent, state, &step, tick) {
                    Decision::Act(text) => return Some(text),
                    Decision::Wait => return None,
                    Decision::Failed => {}
                }
            }
            // An unresolvable step without LLM help hands the tick to the
            // fallback tree below.
        } else if state.role.llm_enabled {
            // 7. No plan at all: general reasoning.
            match self.general_reasoning(world, agent, state, tick) {
                Decision::Act(text) => return Some(text),
                Decision::Wait => return None,
                Decision::Failed => {}
            }
        }

        // 8. Fallback tree; guaranteed to answer by construction.
        let action = self.fallback.run(agent, world);
        if action.is_none() {
            warn!(agent = %agent, "fallback tree returned no action");
        }
        action
    }

    /// Step 6's LLM path: poll the outstanding request for this exact step,
    /// or issue a new one.
    fn resolve_step_via_llm(
        &mut self,
        world: &World,
        agent: EntityId,
        state: &mut AiState,
        step: &ActionStep,
        tick: Tick,
    ) -> Decision {
        if let Some(id) = state.pending_prompt_id.clone() {
            if state.pending_for_step.as_deref() == Some(step.action.as_str()) {
                return match self.broker.poll(&id) {
                    PollResult::Pending => Decision::Wait,
                    PollResult::Ready(text) => {
                        state.clear_pending();
                        if sentinel::is_sentinel(&text) {
                            debug!(agent = %agent, sentinel = %text, "step request failed");
                            bump_front_retry(state, tick, self.config.max_plan_step_retries);
                            state.last_llm_action_tick = Some(tick);
                            Decision::Failed
                        } else {
                            state.current_plan.pop_front();
                            state.general_action_retries = 0;
                            Decision::Act(text)
                        }
                    }
                    PollResult::Unknown => {
                        state.clear_pending();
                        bump_front_retry(state, tick, self.config.max_plan_step_retries);
                        state.last_llm_action_tick = Some(tick);
                        Decision::Failed
                    }
                };
            }
            // The outstanding request answered a step that no longer fronts
            // the plan; never apply a stale response.
            warn!(agent = %agent, "discarding stale pending request");
            self.broker.pending().remove(&id);
            state.clear_pending();
        }

        let obstacle = goal_path_obstacle(world, agent, state);
        let prompt = prompts::build_step_prompt(agent, world, state, step, obstacle);
        let response = self.broker.request(&prompt, tick);
        if sentinel::is_pending(&response) {
            state.pending_for_step = Some(step.action.clone());
            state.pending_prompt_id = Some(response);
            return Decision::Wait;
        }
        if sentinel::is_sentinel(&response) {
            debug!(agent = %agent, sentinel = %response, "step request failed");
            bump_front_retry(state, tick, self.config.max_plan_step_retries);
            state.last_llm_action_tick = Some(tick);
            return Decision::Failed;
        }
        state.current_plan.pop_front();
        state.general_action_retries = 0;
        Decision::Act(response)
    }

    /// Step 7: full world-state prompt when no plan exists
    fn general_reasoning(
        &mut self,
        world: &World,
        agent: EntityId,
        state: &mut AiState,
        tick: Tick,
    ) -> Decision {
        if let Some(id) = state.pending_prompt_id.clone() {
            if state.pending_for_step.is_none() {
                return match self.broker.poll(&id) {
                    PollResult::Pending => Decision::Wait,
                    PollResult::Ready(text) => {
                        state.clear_pending();
                        if sentinel::is_sentinel(&text) {
                            debug!(agent = %agent, sentinel = %text, "general request failed");
                            state.general_action_retries += 1;
                            state.last_llm_action_tick = Some(tick);
                            Decision::Failed
                        } else {
                            state.general_action_retries = 0;
                            Decision::Act(text)
                        }
                    }
                    PollResult::Unknown => {
                        state.clear_pending();
                        state.general_action_retries += 1;
                        state.last_llm_action_tick = Some(tick);
                        Decision::Failed
                    }
                };
            }
            // Pending for a plan step, but the plan is gone.
            warn!(agent = %agent, "discarding stale step request");
            self.broker.pending().remove(&id);
            state.clear_pending();
        }

        if state.general_action_retries > self.config.max_plan_step_retries {
            debug!(agent = %agent, "general retries exhausted; deferring to fallback");
            state.general_action_retries = 0;
            return Decision::Failed;
        }

        let prompt = prompts::build_general_prompt(agent, world, state, &self.config);
        let response = self.broker.request(&prompt, tick);
        if sentinel::is_pending(&response) {
            state.pending_prompt_id = Some(response);
            state.pending_for_step = None;
            return Decision::Wait;
        }
        if sentinel::is_sentinel(&response) {
            debug!(agent = %agent, sentinel = %response, "general request failed");
            state.general_action_retries += 1;
            state.last_llm_action_tick = Some(tick);
            return Decision::Failed;
        }
        state.general_action_retries = 0;
        Decision::Act(response)
    }
}

/// Increment the front step's retry counter; exhaustion past `max_retries`
/// discards the whole plan and forces replanning on a later tick.
fn bump_front_retry(state: &mut AiState, tick: Tick, max_retries: u32) {
    let Some(step) = state.current_plan.front_mut() else {
        return;
    };
    step.retries += 1;
    if step.retries > max_retries {
        warn!(step = %step.action, retries = step.retries, "plan step retries exhausted; discarding plan");
        state.current_plan.clear();
        state.clear_pending();
        state.last_plan_generation_tick = Some(tick);
    }
}

/// Deterministic conversion of a plan step into action text, when no model
/// call is needed
fn direct_step_conversion(
    step: &ActionStep,
    agent: EntityId,
    world: &World,
    role: &AgentRole,
) -> Option<String> {
    match step.step_type.as_deref() {
        Some("move_to") => {
            let target = step.coords()?;
            let pos = world.position(agent)?;
            Some(step_toward(pos, target))
        }
        Some("generate_ability") => {
            if !role.may_generate_abilities {
                return None;
            }
            let description = step.description()?;
            Some(format!("GENERATE_ABILITY {description}"))
        }
        // deal_with_obstacle and friends need the model.
        Some(_) => None,
        None => {
            let text = match step.raw() {
                Some(raw) => format!("{} {}", step.action, raw),
                None => step.action.clone(),
            };
            // Mechanically resolvable iff the line already parses.
            if parser::parse(agent, &text).is_empty() {
                None
            } else {
                Some(text)
            }
        }
    }
}

/// One cardinal step toward `target`, x-axis first; Idle when already there
fn step_toward(pos: GridPos, target: GridPos) -> String {
    if pos == target {
        return "IDLE".to_string();
    }
    let dir = if pos.x != target.x {
        if target.x > pos.x {
            'E'
        } else {
            'W'
        }
    } else if target.y > pos.y {
        'S'
    } else {
        'N'
    };
    format!("MOVE {dir}")
}

/// Obstacle on the straight path from the agent to its current goal
fn goal_path_obstacle(world: &World, agent: EntityId, state: &AiState) -> Option<GridPos> {
    let pos = world.position(agent)?;
    let goal = state.current_goal()?;
    let target = planner::resolve_goal_target(world, goal)?;
    planner::first_obstacle_on_path(world, pos, target)
}

/// Close the loop between the obstacle detector and ability generation: a
/// coordinate-less GENERATE_ABILITY on a blocked goal path gets the
/// obstacle and goal coordinates appended before parsing.
fn contextualize_generation(
    world: &World,
    agent: EntityId,
    state: &AiState,
    text: String,
) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return text;
    };
    let Some(rest) = strip_verb(first.trim(), "GENERATE_ABILITY") else {
        return text;
    };
    if rest.contains('(') {
        // Already carries explicit coordinates.
        return text;
    }
    let Some(obstacle) = goal_path_obstacle(world, agent, state) else {
        return text;
    };
    let Some(target) = state
        .current_goal()
        .and_then(|g| planner::resolve_goal_target(world, g))
    else {
        return text;
    };

    let mut out = format!(
        "GENERATE_ABILITY {} to clear the obstacle at {obstacle} blocking the way to {target}",
        rest.trim()
    );
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Case-insensitive verb prefix strip; requires whitespace after the verb
fn strip_verb<'a>(line: &'a str, verb: &str) -> Option<&'a str> {
    if line.len() <= verb.len() {
        return None;
    }
    let (head, tail) = line.split_at(verb.len());
    if head.eq_ignore_ascii_case(verb) && tail.starts_with(char::is_whitespace) {
        Some(tail)
    } else {
        None
    }
}
