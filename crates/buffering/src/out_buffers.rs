//! Per-node outbound buffers.
//!
//! Work addressed to an unhealthy node waits in that node's [`WeakQueue`].
//! Each buffered item is also handed to the shared [`ExpiringHardRefHolder`],
//! which is what actually keeps it alive; once the holder lets go and nobody
//! else references the item, it silently disappears from the queue.

use crate::expiring::ExpiringHardRefHolder;
use crate::weak_queue::WeakQueue;
use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

pub struct OutBuffers<K, T: ?Sized> {
    queues: DashMap<K, Arc<WeakQueue<T>>>,
    holder: Arc<ExpiringHardRefHolder>,
}

impl<K, T> OutBuffers<K, T>
where
    K: Eq + Hash + Clone + fmt::Display,
    T: ?Sized + Send + Sync + 'static,
{
    pub fn new(holder: Arc<ExpiringHardRefHolder>) -> Self {
        Self {
            queues: DashMap::new(),
            holder,
        }
    }

    /// Buffer `item` for `key`, creating its queue on first use.
    pub fn enqueue(&self, key: K, item: Arc<T>) {
        let queue = Arc::clone(
            self.queues
                .entry(key.clone())
                .or_insert_with(|| Arc::new(WeakQueue::new()))
                .value(),
        );
        queue.push(&item);
        self.holder.hold_on_to(item);
        debug!(node = %key, "buffered outbound item");
    }

    /// The queue for `key`, or a fresh empty one if none exists yet.
    ///
    /// Never creates an entry: pushing into a fallback queue is not seen by
    /// any key. Only [`OutBuffers::enqueue`] buffers work.
    pub fn queue(&self, key: &K) -> Arc<WeakQueue<T>> {
        self.existing(key).unwrap_or_else(|| Arc::new(WeakQueue::new()))
    }

    /// Remove and return every live item buffered for `key`, oldest first.
    pub fn take_live(&self, key: &K) -> Vec<Arc<T>> {
        self.existing(key).map(|queue| queue.drain()).unwrap_or_default()
    }

    /// Number of live items waiting for `key`.
    pub fn pending(&self, key: &K) -> usize {
        self.existing(key).map_or(0, |queue| queue.len())
    }

    fn existing(&self, key: &K) -> Option<Arc<WeakQueue<T>>> {
        self.queues.get(key).map(|queue| Arc::clone(queue.value()))
    }

    /// Forget the queue for `key`. Items still in it are only released once
    /// the holder expires them.
    pub fn remove(&self, key: &K) -> bool {
        self.queues.remove(key).is_some()
    }

    pub fn holder(&self) -> &Arc<ExpiringHardRefHolder> {
        &self.holder
    }
}

impl<K, T: ?Sized> fmt::Debug for OutBuffers<K, T>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutBuffers")
            .field("queues", &self.queues.len())
            .field("holder", &self.holder)
            .finish()
    }
}
