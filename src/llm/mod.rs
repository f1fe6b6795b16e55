//! LLM request brokering
//!
//! Everything between "the reasoning loop wants text for this prompt" and
//! "a chat-completion endpoint eventually answered": the non-blocking
//! broker, the pending-result table shared with the worker thread, the
//! response cache, the HTTP client, the sentinel vocabulary, and the
//! request/response audit trail.

pub mod audit;
pub mod broker;
pub mod cache;
pub mod client;
pub mod pending;
pub mod sentinel;

pub use broker::{BrokerMode, LlmBroker};
pub use client::LlmClient;
pub use pending::{PendingTable, PollResult};
