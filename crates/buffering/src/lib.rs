//! Buffers that hold pending work for unhealthy nodes without leaking it.
//!
//! This crate provides the pieces the grid buffers actions with:
//! - [`WeakQueue`]: FIFO of weak references that skips reclaimed entries
//! - [`ExpiringHardRefHolder`]: keeps buffered work alive for a bounded time
//! - [`OutBuffers`]: per-node weak queues backed by a shared holder

pub mod clock;
pub mod error;
pub mod expiring;
pub mod out_buffers;
pub mod weak_queue;

pub use clock::{Clock, SystemClock};
pub use error::{QueueError, Result};
pub use expiring::ExpiringHardRefHolder;
pub use out_buffers::OutBuffers;
pub use weak_queue::WeakQueue;
