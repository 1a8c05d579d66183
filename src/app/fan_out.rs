use crate::utils::error::{Result, YFinanceError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `tasks` on tokio with at most `limit` in flight at once.
///
/// Results come back in the order of `tasks`. A task that panics is reported as a
/// `ProcessingError` in its slot.
pub async fn run_bounded<T, Fut>(tasks: Vec<Fut>, limit: usize) -> Vec<Result<T>>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let total = tasks.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut join_set = JoinSet::new();

    for (index, task) in tasks.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, task.await)
        });
    }

    let mut slots: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::warn!("Request task join error: {}", e),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(YFinanceError::ProcessingError {
                    message: "Request task did not complete".to_string(),
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tracked_tasks(
        count: usize,
        in_flight: &Arc<AtomicUsize>,
        peak: &Arc<AtomicUsize>,
    ) -> Vec<impl Future<Output = Result<usize>> + Send + 'static> {
        (0..count)
            .map(|i| {
                let in_flight = Arc::clone(in_flight);
                let peak = Arc::clone(peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(tracked_tasks(8, &in_flight, &peak), 3).await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_limit_of_one_runs_sequentially() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        run_bounded(tracked_tasks(4, &in_flight, &peak), 1).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);

        // zero is treated as one
        let peak = Arc::new(AtomicUsize::new(0));
        run_bounded(tracked_tasks(3, &in_flight, &peak), 0).await;
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let tasks: Vec<_> = [30u64, 0, 10]
            .into_iter()
            .enumerate()
            .map(|(i, delay)| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if i == 1 {
                    Err(YFinanceError::ProcessingError {
                        message: "second".to_string(),
                    })
                } else {
                    Ok(i)
                }
            })
            .collect();

        let results = run_bounded(tasks, 3).await;
        assert_eq!(results[0].as_ref().ok(), Some(&0));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().ok(), Some(&2));
    }
}
