pub mod prompts;
pub mod state;
pub mod system;

pub use state::{AgentRole, AiState, Goal, GoalTarget};
pub use system::ReasoningSystem;
