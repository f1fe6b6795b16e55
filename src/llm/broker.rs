//! Non-blocking LLM request broker
//!
//! Decouples tick-time prompt submission from completion latency. The
//! simulation thread calls `request` and always gets a string back
//! immediately: model text (echo mode or cache hit), a failure sentinel, or
//! an opaque `pending:` id to poll on later ticks. In live mode one
//! dedicated worker thread runs its own runtime and processes the bounded
//! request queue strictly in submission order.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::config::ReasoningConfig;
use crate::core::types::Tick;
use crate::llm::audit::AuditLog;
use crate::llm::cache::LruCache;
use crate::llm::client::LlmClient;
use crate::llm::pending::{PendingTable, PollResult};
use crate::llm::sentinel;

/// Operating mode of the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerMode {
    /// Every request answers with a busy sentinel; nothing is queued
    Offline,
    /// Deterministic: answers with the prompt's last non-empty line
    Echo,
    /// Real network calls on the worker thread
    Live,
}

/// One queued unit of work for the worker
struct Job {
    prompt: String,
    id: String,
    tick: Tick,
}

pub struct LlmBroker {
    mode: BrokerMode,
    pending: PendingTable,
    cache: Arc<Mutex<LruCache>>,
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    queue_capacity: usize,
}

impl LlmBroker {
    pub fn offline() -> Self {
        Self::with_mode(BrokerMode::Offline, &ReasoningConfig::default())
    }

    pub fn echo() -> Self {
        Self::with_mode(BrokerMode::Echo, &ReasoningConfig::default())
    }

    /// Live mode with the worker not yet started; `request` answers
    /// not-ready until `start` is called (cache hits still resolve)
    pub fn live(config: &ReasoningConfig) -> Self {
        Self::with_mode(BrokerMode::Live, config)
    }

    fn with_mode(mode: BrokerMode, config: &ReasoningConfig) -> Self {
        Self {
            mode,
            pending: PendingTable::new(),
            cache: Arc::new(Mutex::new(LruCache::new(config.cache_capacity))),
            sender: None,
            worker: None,
            queue_capacity: config.request_queue_capacity,
        }
    }

    pub fn mode(&self) -> BrokerMode {
        self.mode
    }

    /// The table callers poll for in-flight results
    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Spawn the worker thread. No-op outside live mode or when already
    /// running.
    pub fn start(&mut self, client: LlmClient, audit: AuditLog, config: &ReasoningConfig) {
        if self.mode != BrokerMode::Live || self.worker.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel::<Job>(self.queue_capacity);
        let pending = self.pending.clone();
        let cache = Arc::clone(&self.cache);
        let timeout = config.request_timeout;

        let spawned = std::thread::Builder::new()
            .name("llm-broker".into())
            .spawn(move || worker_loop(rx, client, audit, pending, cache, timeout));
        match spawned {
            Ok(handle) => {
                self.sender = Some(tx);
                self.worker = Some(handle);
                info!("llm broker worker started");
            }
            Err(e) => error!(error = %e, "failed to spawn llm broker worker"),
        }
    }

    /// Is the worker accepting requests?
    pub fn is_ready(&self) -> bool {
        match self.mode {
            BrokerMode::Live => self.sender.is_some(),
            _ => true,
        }
    }

    /// Non-blocking request entry point.
    ///
    /// Returns immediate text, a failure sentinel, or a `pending:` id.
    pub fn request(&self, prompt: &str, tick: Tick) -> String {
        match self.mode {
            BrokerMode::Offline => sentinel::OFFLINE.to_string(),
            BrokerMode::Echo => echo_response(prompt),
            BrokerMode::Live => self.request_live(prompt, tick),
        }
    }

    fn request_live(&self, prompt: &str, tick: Tick) -> String {
        if let Some(hit) = self.lock_cache().get(prompt) {
            debug!(tick, "llm cache hit");
            return hit;
        }

        let Some(sender) = &self.sender else {
            debug!(tick, "llm broker not ready");
            return sentinel::NOT_READY.to_string();
        };

        let id = format!("{}{}", sentinel::PENDING_PREFIX, Uuid::new_v4());
        // Insert before queuing so a fast worker cannot resolve into a
        // missing slot.
        self.pending.insert_in_flight(&id);
        let job = Job {
            prompt: prompt.to_string(),
            id: id.clone(),
            tick,
        };
        match sender.try_send(job) {
            Ok(()) => {
                debug!(tick, id = %id, "llm request queued");
                id
            }
            Err(TrySendError::Full(_)) => {
                warn!(tick, "llm request queue full");
                self.pending.remove(&id);
                sentinel::QUEUE_FULL.to_string()
            }
            Err(TrySendError::Closed(_)) => {
                warn!(tick, "llm worker gone; broker no longer ready");
                self.pending.remove(&id);
                sentinel::NOT_READY.to_string()
            }
        }
    }

    /// Poll a pending id; `Ready` consumes the table entry
    pub fn poll(&self, id: &str) -> PollResult {
        self.pending.poll(id)
    }

    /// Preload a canned response for a prompt (live-mode cache-hit path)
    pub fn prime_cache(&self, prompt: &str, response: &str) {
        self.lock_cache().insert(prompt, response);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, LruCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LlmBroker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop after its current job;
        // the thread is detached rather than joined so teardown never waits
        // out a network timeout.
        self.sender.take();
        self.worker.take();
    }
}

/// Echo mode: the prompt's last non-empty line, trimmed
fn echo_response(prompt: &str) -> String {
    prompt
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| sentinel::EMPTY.to_string())
}

/// Worker thread body: single consumer, one network call at a time, strict
/// submission order. A malformed response resolves the handle with a
/// sentinel and the loop continues; only a runtime construction failure is
/// fatal.
fn worker_loop(
    mut rx: mpsc::Receiver<Job>,
    client: LlmClient,
    audit: AuditLog,
    pending: PendingTable,
    cache: Arc<Mutex<LruCache>>,
    timeout: std::time::Duration,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "llm worker could not build runtime; broker permanently not ready");
            return;
        }
    };

    runtime.block_on(async {
        while let Some(job) = rx.recv().await {
            if let Err(e) = audit.append(
                job.tick,
                "llm_request",
                serde_json::json!({"id": job.id, "prompt": job.prompt}),
            ) {
                warn!(error = %e, "audit append failed");
            }

            let text = match client.complete(&job.prompt, timeout).await {
                Ok(content) => {
                    cache
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(job.prompt.clone(), content.clone());
                    content
                }
                Err(failure) => {
                    let s = failure.to_sentinel();
                    warn!(id = %job.id, sentinel = %s, "llm call failed");
                    s
                }
            };

            if let Err(e) = audit.append(
                job.tick,
                "llm_response",
                serde_json::json!({"id": job.id, "response": text}),
            ) {
                warn!(error = %e, "audit append failed");
            }

            pending.resolve(&job.id, text);
        }
        debug!("llm worker channel closed; exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_mode_returns_sentinel() {
        let broker = LlmBroker::offline();
        assert_eq!(broker.request("anything", 0), sentinel::OFFLINE);
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_echo_mode_returns_last_nonempty_line() {
        let broker = LlmBroker::echo();
        assert_eq!(broker.request("first line\n\nhello\n   \n", 0), "hello");
        assert_eq!(broker.request("", 0), sentinel::EMPTY);
    }

    #[test]
    fn test_live_not_ready_without_worker() {
        let broker = LlmBroker::live(&ReasoningConfig::default());
        assert!(!broker.is_ready());
        assert_eq!(broker.request("prompt", 0), sentinel::NOT_READY);
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_live_cache_hit_precedes_readiness() {
        let broker = LlmBroker::live(&ReasoningConfig::default());
        broker.prime_cache("what now?", "MOVE N");
        assert_eq!(broker.request("what now?", 0), "MOVE N");
    }

    #[test]
    fn test_echo_trims_lines() {
        let broker = LlmBroker::echo();
        assert_eq!(broker.request("a\n  MOVE N  ", 0), "MOVE N");
    }

    #[test]
    fn test_live_worker_resolves_unreachable_endpoint_with_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReasoningConfig::default();
        let mut broker = LlmBroker::live(&config);
        // Port 9 (discard) refuses the connection immediately; no network
        // involved.
        let client = LlmClient::new(
            "key".into(),
            "http://127.0.0.1:9/v1/chat/completions".into(),
            "test-model".into(),
        );
        let audit = AuditLog::new(dir.path().join("audit.jsonl"), config.audit_rotate_bytes);
        broker.start(client, audit, &config);
        assert!(broker.is_ready());

        let id = broker.request("what now?", 1);
        assert!(sentinel::is_pending(&id));

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(30);
        let text = loop {
            match broker.poll(&id) {
                PollResult::Ready(text) => break text,
                PollResult::Pending => {
                    assert!(std::time::Instant::now() < deadline, "worker never resolved");
                    std::thread::sleep(std::time::Duration::from_millis(20));
                }
                PollResult::Unknown => panic!("pending entry vanished before being polled"),
            }
        };
        assert!(sentinel::is_sentinel(&text), "expected sentinel, got {text}");
        assert!(broker.pending().is_empty());

        // Both sides of the exchange reached the audit trail.
        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        assert!(contents.contains("llm_request"));
        assert!(contents.contains("llm_response"));
    }
}
