/// Query executor
///
/// Evaluates a [`QueryCondition`] as a full scan of a [`Keyspace`].
use super::condition::QueryCondition;
use crate::error::{Error, Result};
use crate::keyspace::Keyspace;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Matched keys and their current values
pub type MatchResult = BTreeMap<String, String>;

/// Outcome of evaluating one key against a condition
#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Match(String),
    Rejected,
    /// A fetch failed; the key is left out of the result
    Skipped,
}

/// Runs statements against a borrowed keyspace.
///
/// The executor owns nothing but the borrow; every call scans the keyspace
/// afresh, one operation at a time.
pub struct Executor<'k, K: Keyspace + ?Sized> {
    keyspace: &'k K,
}

impl<'k, K: Keyspace + ?Sized> Executor<'k, K> {
    /// Creates an executor over `keyspace`.
    pub fn new(keyspace: &'k K) -> Self {
        Self { keyspace }
    }

    /// The keyspace this executor scans.
    pub fn keyspace(&self) -> &'k K {
        self.keyspace
    }

    /// Returns every key satisfying `condition` with its value.
    ///
    /// Fails with [`Error::NotConnected`] if the keyspace has no connection,
    /// whether before the scan or partway through it, and with the
    /// keyspace's own error if the key enumeration fails. Keys whose TTL or
    /// value cannot be read for any other reason are left out rather than
    /// failing the scan.
    pub fn execute(&self, condition: &QueryCondition) -> Result<MatchResult> {
        if !self.keyspace.is_connected() {
            return Err(Error::NotConnected);
        }

        let keys = self.keyspace.list_all_keys()?;
        debug!(source = %condition.source, keys = keys.len(), "scanning keyspace");

        let mut result = MatchResult::new();
        let mut skipped = 0usize;
        for key in keys {
            match self.evaluate(&key, condition)? {
                Verdict::Match(value) => {
                    result.insert(key, value);
                }
                Verdict::Rejected => {}
                Verdict::Skipped => skipped += 1,
            }
        }

        debug!(
            source = %condition.source,
            matched = result.len(),
            skipped,
            "scan finished"
        );
        Ok(result)
    }

    fn evaluate(&self, key: &str, condition: &QueryCondition) -> Result<Verdict> {
        if let Some(ref pattern) = condition.key_pattern {
            if !pattern.is_match(key) {
                return Ok(Verdict::Rejected);
            }
        }

        if let Some(ref filter) = condition.ttl {
            match self.keyspace.get_ttl(key) {
                Ok(ttl) if filter.admits(ttl) => {}
                Ok(_) => return Ok(Verdict::Rejected),
                Err(e) => {
                    self.check_connection(&e)?;
                    warn!(key, error = %e, "skipping key: TTL lookup failed");
                    return Ok(Verdict::Skipped);
                }
            }
        }

        let value = match self.keyspace.get_value(key) {
            Ok(value) => value,
            Err(e) => {
                self.check_connection(&e)?;
                warn!(key, error = %e, "skipping key: value lookup failed");
                return Ok(Verdict::Skipped);
            }
        };

        Ok(match condition.value_pattern {
            Some(ref pattern) if !pattern.is_match(&value) => Verdict::Rejected,
            _ => Verdict::Match(value),
        })
    }

    /// Turns a per-key failure into [`Error::NotConnected`] when the
    /// connection is gone, so callers abort instead of skipping the key.
    pub(crate) fn check_connection(&self, error: &Error) -> Result<()> {
        if matches!(error, Error::NotConnected) || !self.keyspace.is_connected() {
            warn!(error = %error, "keyspace connection lost, aborting");
            return Err(Error::NotConnected);
        }
        Ok(())
    }
}

/// Runs `condition` against `keyspace`. See [`Executor::execute`].
pub fn execute_query<K: Keyspace + ?Sized>(
    condition: &QueryCondition,
    keyspace: &K,
) -> Result<MatchResult> {
    Executor::new(keyspace).execute(condition)
}
