//! Pending-result table shared between the simulation thread and the worker
//!
//! The one piece of state both threads touch. An id is inserted before its
//! request is queued and removed exactly once: when the result is observed
//! by a poll, or explicitly on fatal failure. An entry whose owner never
//! polls again stays behind; there is no expiry sweep (known leak, see
//! DESIGN.md).

use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;

/// State of one in-flight request
#[derive(Debug, Clone)]
enum PendingSlot {
    InFlight,
    Ready(String),
}

/// Result of polling a pending id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// Still waiting on the worker
    Pending,
    /// Resolved; the entry has been removed from the table
    Ready(String),
    /// No such id (never registered, already consumed, or removed)
    Unknown,
}

/// Thread-safe map of prompt id -> in-flight result
#[derive(Debug, Clone, Default)]
pub struct PendingTable {
    inner: Arc<Mutex<AHashMap<String, PendingSlot>>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AHashMap<String, PendingSlot>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an id before its request is queued
    pub fn insert_in_flight(&self, id: &str) {
        self.lock().insert(id.to_string(), PendingSlot::InFlight);
    }

    /// Resolve an in-flight entry with the worker's result.
    ///
    /// A missing entry means the caller already abandoned it; the result is
    /// dropped.
    pub fn resolve(&self, id: &str, text: String) {
        let mut table = self.lock();
        if let Some(slot) = table.get_mut(id) {
            *slot = PendingSlot::Ready(text);
        }
    }

    /// Drop an entry without observing its result
    pub fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Non-blocking check; consumes the entry once it is ready
    pub fn poll(&self, id: &str) -> PollResult {
        let mut table = self.lock();
        match table.get(id) {
            Some(PendingSlot::InFlight) => PollResult::Pending,
            Some(PendingSlot::Ready(_)) => {
                let Some(PendingSlot::Ready(text)) = table.remove(id) else {
                    unreachable!("entry vanished while table was locked");
                };
                PollResult::Ready(text)
            }
            None => PollResult::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
