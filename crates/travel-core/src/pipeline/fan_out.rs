//! Bounded-concurrency fan-out

use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

use super::PipelineItem;

/// Apply `stage` to every item with at most `concurrency` stages in flight
///
/// Results are collected in completion order, not input order; callers that
/// need a stable order must sort afterwards. The first failing stage fails the
/// whole call and every other in-flight or pending stage is dropped. A
/// concurrency of zero is treated as one.
pub async fn fan_out<I, O, F, Fut>(
    items: impl IntoIterator<Item = I>,
    concurrency: usize,
    stage: F,
) -> PipelineItem<Vec<O>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = PipelineItem<O>>,
{
    stream::iter(items)
        .map(stage)
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PipelineError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many stages run at once
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_five_items_three_workers() {
        let in_flight = Arc::new(InFlight::default());
        let delays = [40u64, 10, 30, 5, 20];

        let results = fan_out(delays, 3, |delay| {
            let in_flight = in_flight.clone();
            async move {
                in_flight.enter();
                tokio::time::sleep(Duration::from_millis(delay)).await;
                in_flight.leave();
                Ok(delay)
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 5);
        let mut sorted = results.clone();
        sorted.sort();
        assert_eq!(sorted, vec![5, 10, 20, 30, 40]);
        assert!(in_flight.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_output_follows_completion_order() {
        let results = fan_out([60u64, 5], 2, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(delay)
        })
        .await
        .unwrap();

        assert_eq!(results, vec![5, 60]);
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_call() {
        let completed = Arc::new(AtomicUsize::new(0));

        let result = fan_out(1..=5u32, 3, |n| {
            let completed = completed.clone();
            async move {
                if n == 3 {
                    return Err(PipelineError::Invalid(format!("item {}", n)));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(err.to_string().contains("item 3"));
        // Item 3 fails before any sibling finishes sleeping
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let results = fan_out(vec![1, 2], 0, |n| async move { Ok(n) }).await.unwrap();
        assert_eq!(results, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<u8> = fan_out(Vec::<u8>::new(), 4, |n| async move { Ok(n) })
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
