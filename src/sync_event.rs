//! Correlation primitive pairing a blocked requester with the asynchronous
//! event that completes its request.
//!
//! A [`SyncEvent`] is a mutex-protected slot plus a condition variable.  The
//! requester arms the event with [`SyncEvent::guard()`] *before* issuing its
//! request, and keeps the returned [`SyncEventGuard`] until it waits.  The
//! producer must take the same lock to [`SyncEvent::notify()`], so it cannot
//! signal in the window between the request being issued and the requester
//! starting to wait.
//!
//! The slot carries the completing event's payload, so a spurious wakeup can
//! be told apart from a real one, and the waiter learns the outcome without a
//! separate shared flag.
//!
//! Completions carry no request identifier.  When a wait times out, its
//! completion is still owed by the producer, so the event counts it as
//! abandoned and drops the next completion to arrive in its place.  If a
//! completion was already dropped during a wait which then also times out,
//! the count is not raised again: the dropped completion may have been that
//! wait's own, and the one it was dropped for may never come.
//!
//! At most one waiter per event is supported.  Callers serialize themselves.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::{Error, Result};

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    // Completions still owed to requests which timed out
    abandoned: usize,
    // A completion was dropped since the event was last armed
    dropped: bool,
}

/// Wait/notify pairing carrying a payload of type `T`.
#[derive(Debug)]
pub struct SyncEvent<T> {
    name: &'static str,
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

impl<T> SyncEvent<T> {
    /// Create a new, unsignaled event.  `name` is used in log output only.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(Slot {
                value: None,
                abandoned: 0,
                dropped: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Name given at creation, for log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arm the event, returning a guard which holds the event's lock until
    /// [`SyncEventGuard::wait()`] releases it.
    ///
    /// Any payload left over from an earlier request is discarded.
    pub fn guard(&self) -> SyncEventGuard<'_, T> {
        let mut slot = self.lock();
        self.rearm(&mut slot);
        SyncEventGuard { event: self, slot }
    }

    /// Arm the event without holding its lock, for requesters which poll with
    /// [`Self::try_take()`] and report expiry with [`Self::abandon()`].
    ///
    /// Any payload left over from an earlier request is discarded.
    pub fn arm(&self) {
        let mut slot = self.lock();
        self.rearm(&mut slot);
    }

    /// Signal the event with `value`, waking the waiter if there is one.
    ///
    /// Returns false if `value` was dropped as the late completion of a
    /// request which timed out.
    ///
    /// With no waiter the value is kept until the next arm discards it, or
    /// [`Self::try_take()`] collects it.
    pub fn notify(&self, value: T) -> bool {
        let mut slot = self.lock();
        if slot.abandoned > 0 {
            slot.abandoned -= 1;
            slot.dropped = true;
            debug!("{}: dropped late completion of timed out request", self.name);
            return false;
        }
        if slot.value.is_some() {
            warn!("{}: overwriting unconsumed completion", self.name);
        }
        slot.value = Some(value);
        self.cond.notify_one();
        true
    }

    /// Collect the pending payload, if any, without blocking.
    pub fn try_take(&self) -> Option<T> {
        self.lock().value.take()
    }

    /// Give up on the armed request after polling with [`Self::try_take()`].
    ///
    /// Returns the payload if it arrived after the last poll.  Otherwise the
    /// request's completion is counted as abandoned.
    pub fn abandon(&self) -> Option<T> {
        let mut slot = self.lock();
        match slot.value.take() {
            Some(value) => Some(value),
            None => {
                self.abandon_locked(&mut slot);
                None
            }
        }
    }

    /// Number of completions still owed to requests which timed out.
    pub fn abandoned(&self) -> usize {
        self.lock().abandoned
    }

    fn rearm(&self, slot: &mut Slot<T>) {
        if slot.value.take().is_some() {
            debug!("{}: discarded stale completion", self.name);
        }
        slot.dropped = false;
    }

    fn abandon_locked(&self, slot: &mut Slot<T>) {
        if slot.dropped {
            debug!("{}: completion dropped during this wait, not counting", self.name);
        } else {
            slot.abandoned += 1;
        }
    }

    // The slot holds plain values, so state behind a poisoned lock is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Armed [`SyncEvent`].  Holds the event's lock.
#[must_use = "dropping the guard disarms the event without waiting"]
pub struct SyncEventGuard<'a, T> {
    event: &'a SyncEvent<T>,
    slot: MutexGuard<'a, Slot<T>>,
}

impl<T> SyncEventGuard<'_, T> {
    /// Release the lock and block until the event is signaled, returning its
    /// payload.
    ///
    /// With `timeout` of `None` this waits forever.  Otherwise returns
    /// [`Error::Timeout`] if no payload arrives in time, and the late payload
    /// is dropped when it does arrive.
    pub fn wait(self, timeout: Option<Duration>) -> Result<T> {
        let SyncEventGuard { event, slot } = self;

        let mut slot = match timeout {
            None => event
                .cond
                .wait_while(slot, |slot| slot.value.is_none())
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                event
                    .cond
                    .wait_timeout_while(slot, timeout, |slot| slot.value.is_none())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };

        match slot.value.take() {
            Some(value) => Ok(value),
            None => {
                warn!("{}: no completion after {timeout:?}", event.name);
                event.abandon_locked(&mut slot);
                Err(Error::Timeout)
            }
        }
    }
}
