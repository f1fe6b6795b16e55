//! Per-agent AI state
//!
//! One `AiState` per AI-controlled entity, owned by the world's component
//! store. Mutated only by the reasoning loop and the action executor, both
//! on the simulation thread.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::types::{EntityId, GridPos, Tick};
use crate::planner::plan::ActionStep;

/// What a goal is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalTarget {
    Entity(EntityId),
    Position(GridPos),
}

/// A gameplay-provided objective; read-only to the reasoning core,
/// consumed front-first (goals[0] is current)
#[derive(Debug, Clone)]
pub struct Goal {
    pub kind: String,
    pub target: Option<GoalTarget>,
    pub conditions: AHashMap<String, String>,
}

impl Goal {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            conditions: AHashMap::new(),
        }
    }

    pub fn with_target(kind: impl Into<String>, target: GoalTarget) -> Self {
        Self {
            kind: kind.into(),
            target: Some(target),
            conditions: AHashMap::new(),
        }
    }
}

/// Gates on what the LLM path may do for this agent
#[derive(Debug, Clone)]
pub struct AgentRole {
    /// May this agent use the LLM at all?
    pub llm_enabled: bool,
    /// May prompts offer (and plans request) generated abilities?
    pub may_generate_abilities: bool,
}

impl Default for AgentRole {
    fn default() -> Self {
        Self {
            llm_enabled: true,
            may_generate_abilities: true,
        }
    }
}

/// Persistent per-agent reasoning state; the tick state machine is
/// re-evaluated fresh from these fields every tick
#[derive(Debug, Clone)]
pub struct AiState {
    pub personality: String,
    pub role: AgentRole,
    pub goals: Vec<Goal>,
    /// Front is the next step to execute
    pub current_plan: VecDeque<ActionStep>,
    /// Non-null only while a matching in-flight entry exists in the
    /// broker's pending table
    pub pending_prompt_id: Option<String>,
    /// Verb of the step the pending request answers; guards a resolved
    /// response from being applied to a different, rotated step. None for a
    /// general (no-plan) request.
    pub pending_for_step: Option<String>,
    /// Tick of the last LLM-originated action, for cooldown gating
    pub last_llm_action_tick: Option<Tick>,
    /// One-shot cooldown bypass; cleared when consumed
    pub needs_immediate_rethink: bool,
    /// Set by the executor when the last action had no effect; consumed
    /// once per tick
    pub last_action_failed: bool,
    /// Agent is blocked waiting on an externally generated capability
    pub waiting_for_ability: bool,
    /// Newly available capability name, emitted as USE_ABILITY next tick
    pub ability_hint: Option<String>,
    pub general_action_retries: u32,
    /// Guards against more than one planning request per tick
    pub last_plan_generation_tick: Option<Tick>,
}

impl AiState {
    pub fn new(personality: impl Into<String>) -> Self {
        Self {
            personality: personality.into(),
            role: AgentRole::default(),
            goals: Vec::new(),
            current_plan: VecDeque::new(),
            pending_prompt_id: None,
            pending_for_step: None,
            last_llm_action_tick: None,
            needs_immediate_rethink: false,
            last_action_failed: false,
            waiting_for_ability: false,
            ability_hint: None,
            general_action_retries: 0,
            last_plan_generation_tick: None,
        }
    }

    pub fn with_role(personality: impl Into<String>, role: AgentRole) -> Self {
        Self {
            role,
            ..Self::new(personality)
        }
    }

    pub fn push_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// The goal currently being pursued
    pub fn current_goal(&self) -> Option<&Goal> {
        self.goals.first()
    }

    /// Clear pending-request bookkeeping (not the broker's table entry)
    pub fn clear_pending(&mut self) {
        self.pending_prompt_id = None;
        self.pending_for_step = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = AiState::new("curious");
        assert!(state.goals.is_empty());
        assert!(state.current_plan.is_empty());
        assert!(state.pending_prompt_id.is_none());
        assert!(state.last_llm_action_tick.is_none());
        assert!(state.role.llm_enabled);
    }

    #[test]
    fn test_clear_pending() {
        let mut state = AiState::new("stoic");
        state.pending_prompt_id = Some("pending:x".into());
        state.pending_for_step = Some("DEAL_WITH_OBSTACLE".into());
        state.clear_pending();
        assert!(state.pending_prompt_id.is_none());
        assert!(state.pending_for_step.is_none());
    }
}
