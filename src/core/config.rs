//! Reasoning core configuration with documented constants
//!
//! The retry/cooldown constants were fixed values in early builds; they are
//! collected here as tunables so scenarios can trade LLM call frequency
//! against responsiveness.

use std::time::Duration;

use crate::core::error::{AgentWorldError, Result};

/// Tunables for the reasoning loop, planner, and LLM broker
///
/// Owned by the simulation root and passed explicitly to constructors;
/// there is no global registry.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    // === REASONING LOOP ===
    /// Minimum ticks between LLM-originated actions for one agent
    ///
    /// Bounds LLM call frequency per agent regardless of tick rate.
    /// `needs_immediate_rethink` bypasses the gate exactly once.
    pub llm_cooldown_ticks: u64,

    /// Retries allowed per plan step before the whole plan is discarded
    pub max_plan_step_retries: u32,

    /// How far an agent can see when the general prompt lists nearby entities
    pub perception_radius: u32,

    // === PLANNER ===
    /// Upper bound on the planner's busy-wait for a pending response
    ///
    /// On expiry the planner returns an empty plan and the caller replans
    /// on a later tick. This wait is the one deliberate blocking point on
    /// the simulation thread.
    pub plan_poll_timeout: Duration,

    /// Sleep between pending-table checks inside the planner poll loop
    pub plan_poll_interval: Duration,

    // === LLM BROKER ===
    /// Bound on the cross-thread request queue
    ///
    /// A full queue resolves the request immediately with a queue-full
    /// sentinel instead of blocking the simulation thread.
    pub request_queue_capacity: usize,

    /// Entries kept in the prompt -> response cache before LRU eviction
    pub cache_capacity: usize,

    /// Network timeout for one chat-completion call on the worker thread
    pub request_timeout: Duration,

    // === AUDIT LOG ===
    /// Size threshold (bytes) past which the audit log file is rotated
    pub audit_rotate_bytes: u64,

    // === WORLD ===
    /// Recent world events retained for prompt building
    pub event_buffer: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            llm_cooldown_ticks: 10,
            max_plan_step_retries: 3,
            perception_radius: 8,
            plan_poll_timeout: Duration::from_secs(5),
            plan_poll_interval: Duration::from_millis(50),
            request_queue_capacity: 64,
            cache_capacity: 128,
            request_timeout: Duration::from_secs(15),
            audit_rotate_bytes: 1024 * 1024,
            event_buffer: 64,
        }
    }
}

impl ReasoningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.llm_cooldown_ticks == 0 {
            return Err(AgentWorldError::ConfigError(
                "llm_cooldown_ticks must be at least 1".into(),
            ));
        }
        if self.request_queue_capacity == 0 || self.cache_capacity == 0 {
            return Err(AgentWorldError::ConfigError(
                "broker queue and cache capacities must be positive".into(),
            ));
        }
        if self.plan_poll_interval >= self.plan_poll_timeout {
            return Err(AgentWorldError::ConfigError(format!(
                "plan_poll_interval ({:?}) must be shorter than plan_poll_timeout ({:?})",
                self.plan_poll_interval, self.plan_poll_timeout
            )));
        }
        Ok(())
    }
}
