//! FIFO queue of weak references.
//!
//! Buffered actions are tied to in-flight actor messages. When everything else
//! has let go of an action, replaying it would be meaningless, so the queue
//! only holds it weakly and silently skips it once it is gone. No cancellation
//! protocol is needed: dropping the last strong reference is the cancellation.
//!
//! # Guarantees
//!
//! - `poll`, `dequeue`, `peek` and iteration never return a reclaimed entry
//! - live entries are observed in enqueue order
//! - a dead reference is never accepted
//!
//! # Concurrency
//!
//! Critical sections are a handful of pointer operations, so callers spin for
//! the lock (with exponential backoff) instead of parking.

use crate::error::{QueueError, Result};
use crossbeam::utils::Backoff;
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

pub struct WeakQueue<T: ?Sized> {
    entries: Mutex<VecDeque<Weak<T>>>,
}

impl<T: ?Sized> WeakQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    fn acquire(&self) -> MutexGuard<'_, VecDeque<Weak<T>>> {
        let backoff = Backoff::new();
        loop {
            if let Some(guard) = self.entries.try_lock() {
                return guard;
            }
            backoff.snooze();
        }
    }

    /// Append a weak reference.
    ///
    /// # Errors
    ///
    /// [`QueueError::InvalidArgument`] if the reference is already dead; the
    /// queue is left untouched.
    pub fn enqueue(&self, item: Weak<T>) -> Result<()> {
        if item.strong_count() == 0 {
            return Err(QueueError::InvalidArgument("cannot enqueue a dead reference"));
        }
        self.acquire().push_back(item);
        Ok(())
    }

    /// Append a weak reference to a live value.
    pub fn push(&self, item: &Arc<T>) {
        self.acquire().push_back(Arc::downgrade(item));
    }

    /// Append each reference in order.
    ///
    /// Stops at the first dead reference: entries before it remain enqueued,
    /// it and everything after it are not.
    pub fn enqueue_all<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = Weak<T>>,
    {
        for item in items {
            self.enqueue(item)?;
        }
        Ok(())
    }

    /// Remove and return the oldest live entry.
    ///
    /// Dead entries in front of it are dropped for good.
    pub fn poll(&self) -> Option<Arc<T>> {
        let mut entries = self.acquire();
        while let Some(entry) = entries.pop_front() {
            if let Some(live) = entry.upgrade() {
                return Some(live);
            }
        }
        None
    }

    /// Like [`poll`](Self::poll) but fails on an empty queue.
    pub fn dequeue(&self) -> Result<Arc<T>> {
        self.poll().ok_or(QueueError::Empty)
    }

    /// Return the oldest live entry without removing it.
    pub fn peek(&self) -> Option<Arc<T>> {
        let mut entries = self.acquire();
        loop {
            let live = entries.front()?.upgrade();
            if live.is_some() {
                return live;
            }
            entries.pop_front();
        }
    }

    /// Remove and return every live entry, oldest first.
    pub fn drain(&self) -> Vec<Arc<T>> {
        let drained: Vec<_> = self.acquire().drain(..).collect();
        drained.into_iter().filter_map(|entry| entry.upgrade()).collect()
    }

    /// Drop dead entries, returning how many were dropped.
    pub fn expunge(&self) -> usize {
        let mut entries = self.acquire();
        let before = entries.len();
        entries.retain(|entry| entry.strong_count() > 0);
        before - entries.len()
    }

    /// Snapshot of the live entries, oldest first. Dead entries are expunged.
    pub fn iter(&self) -> std::vec::IntoIter<Arc<T>> {
        let mut entries = self.acquire();
        let mut live = Vec::with_capacity(entries.len());
        entries.retain(|entry| match entry.upgrade() {
            Some(value) => {
                live.push(value);
                true
            }
            None => false,
        });
        live.into_iter()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.acquire()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for WeakQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a WeakQueue<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: ?Sized> fmt::Debug for WeakQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakQueue").field("live", &self.len()).finish()
    }
}
