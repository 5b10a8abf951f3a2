//! Bounded-lifetime strong references.
//!
//! A [`WeakQueue`](crate::WeakQueue) alone would let a buffered action vanish
//! the moment its creator returns. The holder keeps a strong reference to
//! each buffered value for at least `timeout`, then lets go, so nothing
//! buffered is held forever.
//!
//! This is a memory bound, not a delivery guarantee: a value released here
//! survives only if something else still references it.

use crate::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// How long a value is held unless configured otherwise.
pub const DEFAULT_HOLD_TIMEOUT: Duration = Duration::from_secs(20);

/// How often the background sweeper runs unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest period the background sweeper runs at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

struct Held {
    best_before: Instant,
    sequence: u64,
    _reference: Box<dyn Any + Send + Sync>,
}

impl PartialEq for Held {
    fn eq(&self, other: &Self) -> bool {
        self.best_before == other.best_before && self.sequence == other.sequence
    }
}

impl Eq for Held {}

impl PartialOrd for Held {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Held {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap, but the earliest expiry must surface first
        other
            .best_before
            .cmp(&self.best_before)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub struct ExpiringHardRefHolder {
    timeout: Duration,
    clock: Arc<dyn Clock>,
    heap: Mutex<BinaryHeap<Held>>,
    sequence: AtomicU64,
}

impl ExpiringHardRefHolder {
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            timeout,
            clock,
            heap: Mutex::new(BinaryHeap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Keep `reference` alive until at least `now + timeout`.
    ///
    /// Returns the instant after which it becomes eligible for release.
    pub fn hold_on_to<R>(&self, reference: R) -> Instant
    where
        R: Send + Sync + 'static,
    {
        let best_before = self.clock.now() + self.timeout;
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::Relaxed);
        self.heap.lock().push(Held {
            best_before,
            sequence,
            _reference: Box::new(reference),
        });
        best_before
    }

    /// Release every reference whose expiry has passed.
    ///
    /// Stops at the first entry still in the future; the heap order means
    /// everything behind it expires later. Returns the number released.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut expired = Vec::new();
        {
            let mut heap = self.heap.lock();
            while heap.peek().map_or(false, |held| held.best_before < now) {
                if let Some(held) = heap.pop() {
                    expired.push(held);
                }
            }
        }
        // Released values drop here, outside the lock
        let released = expired.len();
        if released > 0 {
            metrics::counter!("grid.holder.released").increment(released as u64);
            trace!(released, remaining = self.len(), "released expired references");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    /// Sweep every `period` on the current tokio runtime.
    ///
    /// The task only holds the holder weakly and ends once it is dropped.
    /// Periods shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let holder = Arc::downgrade(self);
        let period = period.max(MIN_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match holder.upgrade() {
                    Some(holder) => {
                        holder.sweep();
                    }
                    None => break,
                }
            }
        })
    }
}

impl Default for ExpiringHardRefHolder {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_TIMEOUT)
    }
}

impl fmt::Debug for ExpiringHardRefHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringHardRefHolder")
            .field("timeout", &self.timeout)
            .field("held", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    /// Clock that only moves when told to.
    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Instant::now()),
            })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }

    #[test]
    fn test_held_until_timeout_then_released() {
        let clock = ManualClock::new();
        let holder = ExpiringHardRefHolder::with_clock(Duration::from_secs(20), clock.clone());

        let value = Arc::new("in flight".to_string());
        let weak: Weak<String> = Arc::downgrade(&value);
        holder.hold_on_to(value);

        // Only the holder keeps it alive now
        assert!(weak.upgrade().is_some());

        clock.advance(Duration::from_secs(19));
        assert_eq!(holder.sweep(), 0);
        assert!(weak.upgrade().is_some());

        // Exactly at the expiry it is still held
        clock.advance(Duration::from_secs(1));
        assert_eq!(holder.sweep(), 0);
        assert!(weak.upgrade().is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(holder.sweep(), 1);
        assert!(holder.is_empty());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_sweep_stops_at_first_live_entry() {
        let clock = ManualClock::new();
        let holder = ExpiringHardRefHolder::with_clock(Duration::from_secs(10), clock.clone());

        holder.hold_on_to(1u32);
        holder.hold_on_to(2u32);
        clock.advance(Duration::from_secs(5));
        holder.hold_on_to(3u32);
        assert_eq!(holder.len(), 3);

        clock.advance(Duration::from_secs(6));
        assert_eq!(holder.sweep(), 2);
        assert_eq!(holder.len(), 1);

        clock.advance(Duration::from_secs(5));
        assert_eq!(holder.sweep(), 1);
        assert!(holder.is_empty());
    }

    #[test]
    fn test_best_before_is_now_plus_timeout() {
        let clock = ManualClock::new();
        let holder = ExpiringHardRefHolder::with_clock(Duration::from_secs(3), clock.clone());
        let start = clock.now();
        assert_eq!(holder.hold_on_to(()), start + Duration::from_secs(3));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(ExpiringHardRefHolder::default().timeout(), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_sweeper_releases_in_background() {
        let holder = Arc::new(ExpiringHardRefHolder::new(Duration::from_millis(10)));
        let value = Arc::new(5u8);
        let weak = Arc::downgrade(&value);
        holder.hold_on_to(value);

        let sweeper = holder.spawn_sweeper(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(weak.upgrade().is_none());

        drop(holder);
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper stops once the holder is gone")
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_period_sweeper_still_runs() {
        let holder = Arc::new(ExpiringHardRefHolder::new(Duration::from_millis(5)));
        let value = Arc::new(1u8);
        let weak = Arc::downgrade(&value);
        holder.hold_on_to(value);

        let sweeper = holder.spawn_sweeper(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(weak.upgrade().is_none(), "zero period is clamped, not rejected");

        drop(holder);
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper stops once the holder is gone")
            .unwrap();
    }
}
