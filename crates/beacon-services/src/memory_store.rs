//! In-process [`PeerStateStore`] backed by a concurrent map.
//!
//! Expiry is checked lazily on access and eagerly by [`MemoryStore::purge_expired`],
//! which the daemon runs on an interval. Time comes from the tokio clock so
//! tests can pause and advance it.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::store::{PeerStateStore, StoreResult};

#[derive(Debug)]
enum Value {
    Str(String),
    Set(BTreeSet<String>),
    Queue(VecDeque<String>),
}

#[derive(Debug)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(t) if t <= now)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Slot>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `Unavailable` until switched back.
    /// Used for fault testing.
    pub fn simulate_outage(&self, down: bool) {
        self.offline.store(down, Ordering::Relaxed);
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of keys held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    fn evict_if_expired(&self, key: &str) {
        let now = Instant::now();
        self.entries.remove_if(key, |_, slot| slot.is_expired(now));
    }
}

#[async_trait]
impl PeerStateStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_online()?;
        self.evict_if_expired(key);
        match self.entries.get(key) {
            None => Ok(None),
            Some(slot) => match &slot.value {
                Value::Str(s) => Ok(Some(s.clone())),
                _ => Err(StoreError::WrongType(key.to_string())),
            },
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()> {
        self.check_online()?;
        self.entries.insert(
            key.to_string(),
            Slot {
                value: Value::Str(value),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.check_online()?;
        self.evict_if_expired(key);
        Ok(self.entries.remove(key).is_some())
    }

    async fn sadd(&self, set: &str, member: &str) -> StoreResult<bool> {
        self.check_online()?;
        self.evict_if_expired(set);
        let mut slot = self.entries.entry(set.to_string()).or_insert_with(|| Slot {
            value: Value::Set(BTreeSet::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            _ => Err(StoreError::WrongType(set.to_string())),
        }
    }

    async fn srem(&self, set: &str, member: &str) -> StoreResult<bool> {
        self.check_online()?;
        self.evict_if_expired(set);
        let removed = match self.entries.get_mut(set) {
            None => return Ok(false),
            Some(mut slot) => match &mut slot.value {
                Value::Set(members) => members.remove(member),
                _ => return Err(StoreError::WrongType(set.to_string())),
            },
        };
        // An emptied set disappears, like a key that was never written.
        self.entries
            .remove_if(set, |_, slot| matches!(&slot.value, Value::Set(m) if m.is_empty()));
        Ok(removed)
    }

    async fn smembers(&self, set: &str) -> StoreResult<Vec<String>> {
        self.check_online()?;
        self.evict_if_expired(set);
        match self.entries.get(set) {
            None => Ok(Vec::new()),
            Some(slot) => match &slot.value {
                Value::Set(members) => Ok(members.iter().cloned().collect()),
                _ => Err(StoreError::WrongType(set.to_string())),
            },
        }
    }

    async fn expire_max(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.check_online()?;
        self.evict_if_expired(key);
        let candidate = Instant::now() + ttl;
        match self.entries.get_mut(key) {
            None => Ok(false),
            Some(mut slot) => {
                match slot.expires_at {
                    Some(current) if current >= candidate => {}
                    _ => slot.expires_at = Some(candidate),
                }
                Ok(true)
            }
        }
    }

    async fn push(&self, queue: &str, value: String, ttl: Duration) -> StoreResult<()> {
        self.check_online()?;
        self.evict_if_expired(queue);
        let mut slot = self.entries.entry(queue.to_string()).or_insert_with(|| Slot {
            value: Value::Queue(VecDeque::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::Queue(items) => items.push_back(value),
            _ => return Err(StoreError::WrongType(queue.to_string())),
        }
        slot.expires_at = Some(Instant::now() + ttl);
        Ok(())
    }

    async fn drain(&self, queue: &str) -> StoreResult<Vec<String>> {
        self.check_online()?;
        self.evict_if_expired(queue);
        // remove_if holds the shard lock across check and removal, so two
        // concurrent drains can never both see the same items.
        match self
            .entries
            .remove_if(queue, |_, slot| matches!(slot.value, Value::Queue(_)))
        {
            Some((_, Slot {
                value: Value::Queue(items),
                ..
            })) => Ok(items.into()),
            Some(_) => Err(StoreError::WrongType(queue.to_string())),
            None if self.entries.contains_key(queue) => {
                Err(StoreError::WrongType(queue.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.check_online()?;
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.value().is_expired(now))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }
}
