//! Keyspace access.
//!
//! The query engine never talks to a store directly. It needs a handful of
//! primitive operations, expressed by the [`Keyspace`] trait, and is handed
//! an implementation by the caller that owns the connection. Timeouts and
//! cancellation belong to the implementation; any failure it reports is
//! propagated or, for per-key operations during a scan, skipped.
//!
//! [`MemoryKeyspace`] is a thread-safe in-memory implementation with
//! per-key expiry, useful for tests and for embedding.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// TTL reported for a key that never expires.
pub const NO_EXPIRATION: i64 = -1;

/// The primitive operations the engine needs from a key-value store.
///
/// TTLs are expressed in milliseconds. [`Keyspace::get_ttl`] reports
/// [`NO_EXPIRATION`] for persistent keys, and [`Keyspace::set_value`] takes
/// `0` to mean "no expiration".
pub trait Keyspace {
    /// Whether the accessor currently has a live connection
    fn is_connected(&self) -> bool;

    /// Enumerates every key present at scan time
    fn list_all_keys(&self) -> Result<Vec<String>>;

    /// Reads the value stored under `key`
    fn get_value(&self, key: &str) -> Result<String>;

    /// Remaining lifetime of `key` in milliseconds, or [`NO_EXPIRATION`]
    fn get_ttl(&self, key: &str) -> Result<i64>;

    /// Writes `value` under `key`; `ttl_millis == 0` means no expiration
    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()>;

    /// Removes `key`, returning whether it existed
    fn delete_key(&self, key: &str) -> Result<bool>;

    /// Whether `key` currently exists
    fn key_exists(&self, key: &str) -> Result<bool>;
}

impl<K: Keyspace + ?Sized> Keyspace for &K {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn list_all_keys(&self) -> Result<Vec<String>> {
        (**self).list_all_keys()
    }

    fn get_value(&self, key: &str) -> Result<String> {
        (**self).get_value(key)
    }

    fn get_ttl(&self, key: &str) -> Result<i64> {
        (**self).get_ttl(key)
    }

    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()> {
        (**self).set_value(key, value, ttl_millis)
    }

    fn delete_key(&self, key: &str) -> Result<bool> {
        (**self).delete_key(key)
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        (**self).key_exists(key)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// In-memory keyspace with millisecond TTLs.
///
/// Expired keys are invisible to every operation and are purged lazily on
/// the next write or scan. The connection flag can be toggled with
/// [`MemoryKeyspace::disconnect`] to exercise connection-loss paths.
#[derive(Debug)]
pub struct MemoryKeyspace {
    store: RwLock<HashMap<String, Entry>>,
    connected: AtomicBool,
}

impl MemoryKeyspace {
    /// Creates an empty, connected keyspace.
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Marks the keyspace as connected again.
    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Drops the simulated connection; every operation then fails with
    /// [`Error::NotConnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize> {
        let now = Instant::now();
        let store = self.store.read().map_err(|_| Error::LockPoisoned)?;
        Ok(store.values().filter(|e| e.is_live(now)).count())
    }

    /// Returns true if no live key is present.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn live_entry(&self, key: &str) -> Result<Option<Entry>> {
        self.ensure_connected()?;
        let store = self.store.read().map_err(|_| Error::LockPoisoned)?;
        let now = Instant::now();
        Ok(store.get(key).filter(|e| e.is_live(now)).cloned())
    }
}

impl Default for MemoryKeyspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyspace for MemoryKeyspace {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn list_all_keys(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        let mut store = self.store.write().map_err(|_| Error::LockPoisoned)?;
        let now = Instant::now();
        store.retain(|_, e| e.is_live(now));
        Ok(store.keys().cloned().collect())
    }

    fn get_value(&self, key: &str) -> Result<String> {
        self.live_entry(key)?
            .map(|e| e.value)
            .ok_or_else(|| Error::key(key, "no such key"))
    }

    fn get_ttl(&self, key: &str) -> Result<i64> {
        let entry = self
            .live_entry(key)?
            .ok_or_else(|| Error::key(key, "no such key"))?;
        Ok(match entry.expires_at {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX)
            }
            None => NO_EXPIRATION,
        })
    }

    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()> {
        self.ensure_connected()?;
        let expires_at = match ttl_millis {
            0 => None,
            ms => Some(Instant::now() + Duration::from_millis(ms)),
        };
        let mut store = self.store.write().map_err(|_| Error::LockPoisoned)?;
        store.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete_key(&self, key: &str) -> Result<bool> {
        self.ensure_connected()?;
        let mut store = self.store.write().map_err(|_| Error::LockPoisoned)?;
        let now = Instant::now();
        Ok(store.remove(key).is_some_and(|e| e.is_live(now)))
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key)?.is_some())
    }
}

/// Keyspace test double that loses its connection after a fixed number of
/// per-key operations.
#[cfg(test)]
pub(crate) struct DroppingKeyspace {
    pub inner: MemoryKeyspace,
    budget: std::cell::Cell<usize>,
}

#[cfg(test)]
impl DroppingKeyspace {
    /// Allows `budget` per-key operations, then disconnects `inner`.
    pub fn new(inner: MemoryKeyspace, budget: usize) -> Self {
        Self {
            inner,
            budget: std::cell::Cell::new(budget),
        }
    }

    /// Restores the connection with no further operation limit.
    pub fn reconnect(&self) {
        self.budget.set(usize::MAX);
        self.inner.connect();
    }

    fn tick(&self) {
        match self.budget.get() {
            0 => self.inner.disconnect(),
            left => self.budget.set(left - 1),
        }
    }
}

#[cfg(test)]
impl Keyspace for DroppingKeyspace {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn list_all_keys(&self) -> Result<Vec<String>> {
        self.inner.list_all_keys()
    }

    fn get_value(&self, key: &str) -> Result<String> {
        self.tick();
        self.inner.get_value(key)
    }

    fn get_ttl(&self, key: &str) -> Result<i64> {
        self.tick();
        self.inner.get_ttl(key)
    }

    fn set_value(&self, key: &str, value: &str, ttl_millis: u64) -> Result<()> {
        self.tick();
        self.inner.set_value(key, value, ttl_millis)
    }

    fn delete_key(&self, key: &str) -> Result<bool> {
        self.tick();
        self.inner.delete_key(key)
    }

    fn key_exists(&self, key: &str) -> Result<bool> {
        self.tick();
        self.inner.key_exists(key)
    }
}
