pub mod model;
pub mod parser;
pub mod queue;

pub use model::Action;
pub use queue::ActionQueue;
