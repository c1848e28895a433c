//! Batch-then-join executor
//!
//! Items are split into consecutive batches of `width`. All futures of a
//! batch run concurrently and the executor waits for every one of them to
//! finish before issuing the next batch. This is the only backpressure on
//! per-tag registry lookups.

use super::{ConcurrencyError, ConcurrencyResult};
use futures::future::join_all;
use std::future::Future;

/// Upper bound on batch width, kept well below common `ulimit -n` defaults
pub const MAX_BATCH_WIDTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    width: usize,
}

impl BatchExecutor {
    pub fn new(width: usize) -> ConcurrencyResult<Self> {
        if width == 0 {
            return Err(ConcurrencyError::InvalidConfiguration(
                "batch width must be greater than 0".to_string(),
            ));
        }
        if width > MAX_BATCH_WIDTH {
            return Err(ConcurrencyError::LimitExceeded {
                requested: width,
                limit: MAX_BATCH_WIDTH,
            });
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of batches needed for `items` work items
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.width)
    }

    /// Run `task` over every item, at most `width` at a time.
    ///
    /// Results come back in input order.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut pending = items.into_iter().peekable();

        while pending.peek().is_some() {
            let batch: Vec<Fut> = pending.by_ref().take(self.width).map(&task).collect();
            results.extend(join_all(batch).await);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_width_validation() {
        assert!(matches!(
            BatchExecutor::new(0),
            Err(ConcurrencyError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BatchExecutor::new(MAX_BATCH_WIDTH + 1),
            Err(ConcurrencyError::LimitExceeded { .. })
        ));
        assert_eq!(BatchExecutor::new(128).unwrap().width(), 128);
    }

    #[test]
    fn test_batch_count() {
        let executor = BatchExecutor::new(128).unwrap();
        assert_eq!(executor.batch_count(0), 0);
        assert_eq!(executor.batch_count(128), 1);
        assert_eq!(executor.batch_count(300), 3);
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let executor = BatchExecutor::new(4).unwrap();
        let results = executor
            .run((0..10u64).collect(), |i| async move {
                tokio::time::sleep(Duration::from_millis(10 - i)).await;
                i * 2
            })
            .await;
        assert_eq!(results, (0..10u64).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_batches_never_overlap() {
        let width = 8;
        let executor = BatchExecutor::new(width).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let seen_at_start = executor
            .run((0..30usize).collect(), |i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                let finished = Arc::clone(&finished);
                async move {
                    let done_before = finished.load(Ordering::SeqCst);
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    finished.fetch_add(1, Ordering::SeqCst);
                    (i, done_before)
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= width);
        for (i, done_before) in seen_at_start {
            // Every item of batch k starts only after all k * width earlier items finished
            assert!(done_before >= (i / width) * width);
        }
    }
}
