//! Sentinel vocabulary for the broker
//!
//! Transient and permanent failures surface as reserved strings instead of
//! errors so the reasoning loop can branch on "no actionable text" without
//! unwinding. Pending requests are identified by an opaque `pending:` id.

/// Broker is in offline mode; no request was queued
pub const OFFLINE: &str = "[LLM_OFFLINE]";

/// Worker thread not started, or credentials missing
pub const NOT_READY: &str = "[LLM_NOT_READY]";

/// Cross-thread request queue was full
pub const QUEUE_FULL: &str = "[LLM_QUEUE_FULL]";

/// Network call exceeded its bounded timeout
pub const TIMEOUT: &str = "[LLM_TIMEOUT]";

/// Transport-level failure before any HTTP status was received
pub const NETWORK: &str = "[LLM_NETWORK]";

/// Prompt had no content to echo (echo mode only)
pub const EMPTY: &str = "[LLM_EMPTY]";

/// Prefix for opaque pending-request ids
pub const PENDING_PREFIX: &str = "pending:";

/// Sentinel for a specific HTTP error status
pub fn http_status(status: u16) -> String {
    format!("[LLM_HTTP_{status}]")
}

/// Sentinel for a specific malformed-response shape
/// (missing `choices`, `message`, `content`, ...)
pub fn malformed(part: &str) -> String {
    format!("[LLM_MALFORMED_{}]", part.to_ascii_uppercase())
}

/// Is this string a failure sentinel rather than model text?
pub fn is_sentinel(text: &str) -> bool {
    text.starts_with("[LLM_") && text.ends_with(']')
}

/// Is this string an opaque pending-request id?
pub fn is_pending(text: &str) -> bool {
    text.starts_with(PENDING_PREFIX)
}
