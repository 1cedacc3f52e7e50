/// Mutation executor
///
/// UPDATE and DELETE on top of the scan in [`Executor::execute`]. Matching
/// always finishes before the first write, and each matched key is then
/// mutated on its own: a failure on one key is logged and counted, never
/// fatal to the rest. Losing the connection is the exception and stops the
/// mutation with [`Error::NotConnected`].
use super::condition::{DeleteQuery, UpdateKind, UpdateQuery};
use super::executor::Executor;
use crate::error::{Error, Result};
use crate::keyspace::Keyspace;
use std::fmt;
use tracing::{debug, info, warn};

/// Per-key outcome counts of a mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationSummary {
    /// Keys successfully updated or deleted
    pub applied: usize,
    /// Keys whose write or delete failed, or that were already gone
    pub skipped: usize,
}

impl fmt::Display for MutationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} applied, {} skipped", self.applied, self.skipped)
    }
}

type DeleteAction<'a> = Box<dyn Fn(&str) -> Result<bool> + 'a>;

/// A planned DELETE waiting for confirmation.
///
/// Holds the keys that matched at planning time and the action that
/// deletes one of them. [`PendingDeletion::confirm`] works through the keys
/// in order and completes at most once; later calls do nothing, so keys
/// recreated under the same names after a confirmed plan are never touched
/// by it.
pub struct PendingDeletion<'a> {
    source: String,
    keys: Vec<String>,
    action: DeleteAction<'a>,
    done: usize,
    progress: MutationSummary,
    confirmed: bool,
}

impl<'a> PendingDeletion<'a> {
    /// Keys that will be deleted on confirmation.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Keys not yet attempted, after an interrupted confirmation.
    pub fn remaining(&self) -> &[String] {
        &self.keys[self.done..]
    }

    /// Number of keys in the plan.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether [`PendingDeletion::confirm`] has already run to completion.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Deletes the planned keys.
    ///
    /// Per-key failures are counted as skipped. Losing the connection stops
    /// the deletion with [`Error::NotConnected`] and leaves the plan pending:
    /// the next call resumes with the keys not yet attempted, and its
    /// summary covers every attempt. Once all keys have been attempted,
    /// further calls return an empty summary.
    pub fn confirm(&mut self) -> Result<MutationSummary> {
        if self.confirmed {
            debug!("deletion already confirmed, nothing to do");
            return Ok(MutationSummary::default());
        }

        while let Some(key) = self.keys.get(self.done) {
            match (self.action)(key) {
                Ok(true) => self.progress.applied += 1,
                Ok(false) => {
                    debug!(key = %key, "key already gone");
                    self.progress.skipped += 1;
                }
                Err(Error::NotConnected) => {
                    warn!(
                        source = %self.source,
                        deleted = self.progress.applied,
                        remaining = self.keys.len() - self.done,
                        "deletion interrupted, plan left pending"
                    );
                    return Err(Error::NotConnected);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "delete skipped");
                    self.progress.skipped += 1;
                }
            }
            self.done += 1;
        }

        self.confirmed = true;
        info!(
            source = %self.source,
            applied = self.progress.applied,
            skipped = self.progress.skipped,
            "deletion confirmed"
        );
        Ok(self.progress)
    }
}

impl fmt::Debug for PendingDeletion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDeletion")
            .field("source", &self.source)
            .field("keys", &self.keys)
            .field("done", &self.done)
            .field("confirmed", &self.confirmed)
            .finish()
    }
}

/// TTL to write back so a rewrite keeps the key's remaining lifetime.
///
/// Persistent keys map to `0` (no expiration); a key with no time left
/// keeps a 1 ms lifetime instead of becoming persistent.
fn preserved_ttl(ttl: i64) -> u64 {
    if ttl < 0 {
        0
    } else {
        ttl.max(1) as u64
    }
}

impl<'k, K: Keyspace + ?Sized> Executor<'k, K> {
    /// Applies `query` to every key its condition matches.
    ///
    /// Fails if the scan fails or the connection is lost partway through;
    /// other per-key failures show up in [`MutationSummary::skipped`]. A
    /// key rename writes at most one key: once a matched key has been
    /// renamed, the remaining matches are skipped rather than overwriting
    /// it.
    pub fn update(&self, query: &UpdateQuery) -> Result<MutationSummary> {
        let matches = self.execute(&query.condition)?;

        let mut summary = MutationSummary::default();
        let mut renamed = false;
        for key in matches.keys() {
            if renamed {
                warn!(
                    key = %key,
                    new_key = %query.new_value,
                    "rename skipped: target already written by this update"
                );
                summary.skipped += 1;
                continue;
            }

            match self.update_key(key, query) {
                Ok(()) => {
                    summary.applied += 1;
                    renamed = query.kind == UpdateKind::Key;
                }
                Err(e) => {
                    self.check_connection(&e).inspect_err(|_| {
                        warn!(
                            source = %query.source,
                            applied = summary.applied,
                            "update interrupted"
                        );
                    })?;
                    warn!(key = %key, kind = %query.kind, error = %e, "update skipped");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            source = %query.source,
            kind = %query.kind,
            applied = summary.applied,
            skipped = summary.skipped,
            "update finished"
        );
        Ok(summary)
    }

    fn update_key(&self, key: &str, query: &UpdateQuery) -> Result<()> {
        let keyspace = self.keyspace();
        match query.kind {
            UpdateKind::Value => {
                let ttl = keyspace.get_ttl(key)?;
                keyspace.set_value(key, &query.new_value, preserved_ttl(ttl))
            }
            UpdateKind::Key => {
                let new_key = query.new_value.as_str();
                if new_key == key {
                    return Ok(());
                }
                let value = keyspace.get_value(key)?;
                let ttl = keyspace.get_ttl(key)?;
                // Write first: a failed delete leaves two copies, never zero.
                keyspace.set_value(new_key, &value, preserved_ttl(ttl))?;
                keyspace.delete_key(key).inspect_err(|_| {
                    warn!(key, new_key, "renamed key written but old key not deleted");
                })?;
                Ok(())
            }
            UpdateKind::Ttl => {
                let millis = query
                    .ttl_millis()
                    .ok_or_else(|| Error::write(key, "TTL payload is not an integer"))?;
                let value = keyspace.get_value(key)?;
                keyspace.set_value(key, &value, millis)
            }
        }
    }

    /// Computes the keys `query` would delete without deleting anything.
    pub fn plan_delete(&self, query: &DeleteQuery) -> Result<PendingDeletion<'k>> {
        let keys: Vec<String> = self.execute(&query.condition)?.into_keys().collect();
        debug!(source = %query.source, keys = keys.len(), "planned deletion");

        let keyspace = self.keyspace();
        let executor = Executor::new(keyspace);
        let action = move |key: &str| -> Result<bool> {
            if !keyspace.is_connected() {
                return Err(Error::NotConnected);
            }
            keyspace.delete_key(key).or_else(|e| {
                executor.check_connection(&e)?;
                Err(e)
            })
        };

        Ok(PendingDeletion {
            source: query.source.clone(),
            keys,
            action: Box::new(action),
            done: 0,
            progress: MutationSummary::default(),
            confirmed: false,
        })
    }
}

/// Runs an UPDATE. See [`Executor::update`].
pub fn execute_update_query<K: Keyspace + ?Sized>(
    keyspace: &K,
    query: &UpdateQuery,
) -> Result<MutationSummary> {
    Executor::new(keyspace).update(query)
}

/// Plans a DELETE. See [`Executor::plan_delete`].
pub fn plan_delete<'k, K: Keyspace + ?Sized>(
    keyspace: &'k K,
    query: &DeleteQuery,
) -> Result<PendingDeletion<'k>> {
    Executor::new(keyspace).plan_delete(query)
}
