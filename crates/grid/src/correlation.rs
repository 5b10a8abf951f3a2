//! Matching answers to the requests awaiting them.
//!
//! Every request registers a one-shot completion under a fresh
//! [`CorrelationId`]. The waiter races that completion against a timer; the
//! first to finish wins and the other's effect is discarded, so an answer
//! arriving after the timeout is simply dropped.

use crate::protocol::{Answer, AnswerOutcome, CorrelationId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Answer wait used when none is configured.
pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_millis(4000);

#[derive(Debug)]
pub struct PendingAnswers {
    next: AtomicU64,
    waiting: DashMap<CorrelationId, oneshot::Sender<AnswerOutcome>>,
}

impl PendingAnswers {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            waiting: DashMap::new(),
        }
    }

    /// Mint a fresh id and register a completion for it.
    pub fn register(&self) -> (CorrelationId, oneshot::Receiver<AnswerOutcome>) {
        let id = CorrelationId::minted(self.next.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.waiting.insert(id, tx);
        (id, rx)
    }

    /// Complete the request `answer` belongs to.
    ///
    /// Returns `false` if nobody waits for it any more (timed out, cancelled,
    /// or never registered).
    pub fn complete(&self, answer: Answer) -> bool {
        match self.waiting.remove(&answer.correlation) {
            Some((_, tx)) => tx.send(answer.outcome).is_ok(),
            None => {
                debug!(correlation = %answer.correlation, "discarding unmatched answer");
                false
            }
        }
    }

    pub fn is_waiting(&self, correlation: CorrelationId) -> bool {
        self.waiting.contains_key(&correlation)
    }

    pub fn cancel(&self, correlation: CorrelationId) -> bool {
        self.waiting.remove(&correlation).is_some()
    }

    /// Wait for the answer to `correlation`, giving up after `timeout`.
    pub async fn await_answer(
        &self,
        correlation: CorrelationId,
        rx: oneshot::Receiver<AnswerOutcome>,
        timeout: Duration,
    ) -> AnswerOutcome {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => AnswerOutcome::Failure(format!("request {correlation} was abandoned")),
            Err(_) => {
                self.waiting.remove(&correlation);
                metrics::counter!("grid.outbound.answer_timeouts").increment(1);
                warn!(correlation = %correlation, ?timeout, "answer timed out");
                AnswerOutcome::Timeout
            }
        }
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

impl Default for PendingAnswers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answer_completes_waiter() {
        let pending = PendingAnswers::new();
        let (id, rx) = pending.register();
        assert!(pending.is_waiting(id));

        assert!(pending.complete(Answer::new(id, AnswerOutcome::Value(vec![42]))));
        let outcome = pending.await_answer(id, rx, Duration::from_secs(1)).await;
        assert_eq!(outcome, AnswerOutcome::Value(vec![42]));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_wins_and_late_answer_is_discarded() {
        let pending = PendingAnswers::new();
        let (id, rx) = pending.register();

        let outcome = pending.await_answer(id, rx, Duration::from_millis(20)).await;
        assert_eq!(outcome, AnswerOutcome::Timeout);
        assert!(!pending.is_waiting(id), "timed out registration is removed");

        assert!(!pending.complete(Answer::new(id, AnswerOutcome::Value(vec![1]))));
    }

    #[tokio::test]
    async fn test_cancelled_request_is_failure() {
        let pending = PendingAnswers::new();
        let (id, rx) = pending.register();
        assert!(pending.cancel(id));

        let outcome = pending.await_answer(id, rx, Duration::from_secs(1)).await;
        assert!(matches!(outcome, AnswerOutcome::Failure(_)));
    }

    #[test]
    fn test_ids_are_unique() {
        let pending = PendingAnswers::new();
        let (a, _ra) = pending.register();
        let (b, _rb) = pending.register();
        assert_ne!(a, b);
        assert!(a.is_grid_minted() && b.is_grid_minted());
        assert_eq!(pending.len(), 2);
    }
}
