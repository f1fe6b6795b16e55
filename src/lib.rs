//! Agent World - tick-driven agent simulation with an LLM reasoning core

pub mod actions;
pub mod behavior;
pub mod core;
pub mod llm;
pub mod planner;
pub mod reasoning;
pub mod world;
