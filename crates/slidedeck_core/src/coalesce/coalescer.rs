//! Per-key change coalescer with quiet window and hard ceiling.
//!
//! # Responsibility
//! - Collapse bursts of input events per editable region into one commit.
//! - Tell the host event loop when the next commit is due.
//!
//! # Invariants
//! - Only the latest payload per key is retained.
//! - A key commits once it has been quiet for `quiet_window`, or once
//!   `max_wait` has elapsed since its first uncommitted emit.
//! - Keys never delay each other.
//! - A cancelled key never commits.
//! - Due commits are returned ordered by deadline, then by scheduling order.
//!
//! Time is a caller-supplied monotonic offset (`Duration`); the coalescer
//! owns no timers.

use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// Quiet-window / ceiling pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescePolicy {
    pub quiet_window: Duration,
    pub max_wait: Duration,
}

impl Default for CoalescePolicy {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_millis(crate::config::DEFAULT_QUIET_WINDOW_MS),
            max_wait: Duration::from_millis(crate::config::DEFAULT_MAX_WAIT_MS),
        }
    }
}

/// Why a pending payload was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    /// No emit for the key within the quiet window.
    Quiet,
    /// Ceiling reached under continuous input.
    Ceiling,
    /// Explicit flush by the caller (teardown, detach, undo).
    Flush,
}

/// Payload released for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit<K, P> {
    pub key: K,
    pub payload: P,
    pub reason: CommitReason,
}

#[derive(Debug)]
struct Pending<P> {
    payload: P,
    first_emit: Duration,
    last_emit: Duration,
    seq: u64,
}

impl<P> Pending<P> {
    fn ceiling(&self, policy: &CoalescePolicy) -> Duration {
        self.first_emit.saturating_add(policy.max_wait)
    }

    fn deadline(&self, policy: &CoalescePolicy) -> Duration {
        self.last_emit
            .saturating_add(policy.quiet_window)
            .min(self.ceiling(policy))
    }

    fn due_reason(&self, policy: &CoalescePolicy) -> CommitReason {
        if self.ceiling(policy) <= self.last_emit.saturating_add(policy.quiet_window) {
            CommitReason::Ceiling
        } else {
            CommitReason::Quiet
        }
    }
}

/// Coalesces `emit` calls per key into `Commit`s.
#[derive(Debug)]
pub struct ChangeCoalescer<K, P> {
    policy: CoalescePolicy,
    pending: HashMap<K, Pending<P>>,
    next_seq: u64,
}

impl<K, P> ChangeCoalescer<K, P>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(policy: CoalescePolicy) -> Self {
        Self {
            policy,
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn policy(&self) -> CoalescePolicy {
        self.policy
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Records one raw input event for `key` at time `now`.
    ///
    /// Returns a commit when one is due immediately:
    /// - the previous burst already went quiet (host did not poll in time),
    ///   in which case the previous payload is released and `payload` starts
    ///   a new burst;
    /// - or the ceiling is reached at this emit, in which case `payload`
    ///   itself is released.
    pub fn emit(&mut self, key: K, payload: P, now: Duration) -> Option<Commit<K, P>> {
        let seq = self.take_seq();
        let policy = self.policy;

        if let Some(entry) = self.pending.get_mut(&key) {
            if entry.last_emit.saturating_add(policy.quiet_window) <= now {
                let reason = entry.due_reason(&policy);
                let overdue = std::mem::replace(
                    entry,
                    Pending {
                        payload,
                        first_emit: now,
                        last_emit: now,
                        seq,
                    },
                );
                return Some(Commit {
                    key,
                    payload: overdue.payload,
                    reason,
                });
            }

            entry.payload = payload;
            entry.last_emit = now;
            entry.seq = seq;
            if now.saturating_sub(entry.first_emit) >= policy.max_wait {
                let entry = self.pending.remove(&key)?;
                debug!("event=coalesce_ceiling module=coalesce status=ok key={key:?}");
                return Some(Commit {
                    key,
                    payload: entry.payload,
                    reason: CommitReason::Ceiling,
                });
            }
            return None;
        }

        self.pending.insert(
            key,
            Pending {
                payload,
                first_emit: now,
                last_emit: now,
                seq,
            },
        );
        None
    }

    /// Earliest time at which `poll` would release something.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .values()
            .map(|entry| entry.deadline(&self.policy))
            .min()
    }

    /// Releases every key whose deadline is at or before `now`.
    pub fn poll(&mut self, now: Duration) -> Vec<Commit<K, P>> {
        let policy = self.policy;
        let mut due: Vec<(Duration, u64, K)> = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.deadline(&policy) <= now)
            .map(|(key, entry)| (entry.deadline(&policy), entry.seq, key.clone()))
            .collect();
        due.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        due.into_iter()
            .filter_map(|(_, _, key)| {
                let entry = self.pending.remove(&key)?;
                let reason = entry.due_reason(&policy);
                Some(Commit {
                    key,
                    payload: entry.payload,
                    reason,
                })
            })
            .collect()
    }

    /// Releases the pending payload for one key immediately.
    pub fn flush(&mut self, key: &K) -> Option<Commit<K, P>> {
        let entry = self.pending.remove(key)?;
        Some(Commit {
            key: key.clone(),
            payload: entry.payload,
            reason: CommitReason::Flush,
        })
    }

    /// Releases every pending payload in scheduling order.
    pub fn flush_all(&mut self) -> Vec<Commit<K, P>> {
        let mut entries: Vec<(K, Pending<P>)> = self.pending.drain().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries
            .into_iter()
            .map(|(key, entry)| Commit {
                key,
                payload: entry.payload,
                reason: CommitReason::Flush,
            })
            .collect()
    }

    /// Releases pending payloads for keys matching `predicate`.
    pub fn flush_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> Vec<Commit<K, P>> {
        let mut keys: Vec<(u64, K)> = self
            .pending
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(key, entry)| (entry.seq, key.clone()))
            .collect();
        keys.sort_by_key(|(seq, _)| *seq);
        keys.into_iter()
            .filter_map(|(_, key)| self.flush(&key))
            .collect()
    }

    /// Drops the pending payload for `key`. Returns whether one existed.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    /// Drops every pending payload. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<K, P> Default for ChangeCoalescer<K, P>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new(CoalescePolicy::default())
    }
}
