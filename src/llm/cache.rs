//! Bounded LRU cache of prompt -> response
//!
//! Keyed by exact prompt text, independent of the pending-request table.
//! `get` promotes; inserting past capacity evicts the least recently used
//! entry.

use std::collections::VecDeque;

use ahash::AHashMap;

#[derive(Debug)]
pub struct LruCache {
    capacity: usize,
    entries: AHashMap<String, String>,
    /// Keys ordered least recently used first
    order: VecDeque<String>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: AHashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(idx) = self.order.iter().position(|k| k == key) {
            self.order.remove(idx);
        }
        self.order.push_back(key.to_string());
    }

    /// Look up a response, promoting the key to most recently used
    pub fn get(&mut self, key: &str) -> Option<String> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.entries.insert(key.clone(), value.into());
        self.touch(&key);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
