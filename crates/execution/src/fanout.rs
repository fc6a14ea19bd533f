//! Bounded concurrent fan-out with per-item results.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Runs `jobs` with at most `permits` in flight and returns their results in
/// input order. A job that panics is reported by `on_abort`.
pub async fn fan_out<T, Fut>(
    permits: usize,
    jobs: Vec<Fut>,
    on_abort: impl Fn(usize) -> T,
) -> Vec<T>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(permits.max(1)));
    let total = jobs.len();
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, job.await)
        });
    }

    let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, value)) => results[index] = Some(value),
            Err(e) => error!(error = %e, "Task aborted"),
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, value)| value.unwrap_or_else(|| on_abort(index)))
        .collect()
}
