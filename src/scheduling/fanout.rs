//! Fan-out aggregation: run independent calls concurrently, keep every outcome
//!
//! Each task is raced against its own timer. A slow or failing task is
//! recorded in its [`Envelope`] and never blocks or cancels its siblings.

use futures::future::{join_all, BoxFuture};
use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;
use thiserror::Error;

use super::RateLimiter;

/// Why a fan-out call produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FanoutError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("{0}")]
    Call(String),
}

/// Outcome of one fan-out call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Succeeded(T),
    Failed(FanoutError),
}

impl<T> Envelope<T> {
    pub fn succeeded(&self) -> bool {
        matches!(self, Envelope::Succeeded(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Envelope::Succeeded(v) => Some(v),
            Envelope::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FanoutError> {
        match self {
            Envelope::Succeeded(_) => None,
            Envelope::Failed(e) => Some(e),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Envelope::Succeeded(v) => Some(v),
            Envelope::Failed(_) => None,
        }
    }
}

/// A boxed fan-out task.
pub type FanoutTask<'a, T> = BoxFuture<'a, anyhow::Result<T>>;

/// Run all `tasks` concurrently, each bounded by `per_task_timeout`.
///
/// Returns exactly one envelope per task, in input order.
pub async fn gather_all<T>(tasks: Vec<FanoutTask<'_, T>>, per_task_timeout: Duration) -> Vec<Envelope<T>> {
    let raced = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| race(index, task, per_task_timeout));
    join_all(raced).await
}

/// Single call with the same timeout and envelope handling as [`gather_all`].
///
/// Used where a stage's concurrent calls return different types and are
/// joined with `futures::join!` instead.
pub async fn gather_one<T>(task: FanoutTask<'_, T>, timeout: Duration) -> Envelope<T> {
    race(0, task, timeout).await
}

/// Like [`gather_all`], but each task first waits for a slot from `limiter`.
///
/// Slots are reserved in input order. The timeout covers the call only,
/// not the wait for its slot, so a queued call is never timed out before
/// it is issued and never leaves a reserved slot unused.
pub async fn gather_all_paced<T>(
    tasks: Vec<FanoutTask<'_, T>>,
    limiter: &RateLimiter,
    per_task_timeout: Duration,
) -> Vec<Envelope<T>> {
    let paced = tasks.into_iter().enumerate().map(|(index, task)| async move {
        limiter.acquire().await;
        race(index, task, per_task_timeout).await
    });
    join_all(paced).await
}

/// Single paced call; see [`gather_all_paced`].
pub async fn gather_one_paced<T>(
    task: FanoutTask<'_, T>,
    limiter: &RateLimiter,
    timeout: Duration,
) -> Envelope<T> {
    limiter.acquire().await;
    gather_one(task, timeout).await
}

async fn race<T>(index: usize, task: FanoutTask<'_, T>, timeout: Duration) -> Envelope<T> {
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(value)) => Envelope::Succeeded(value),
        Ok(Err(e)) => {
            tracing::debug!(index, error = %e, "Fan-out call failed");
            Envelope::Failed(FanoutError::Call(format!("{e:#}")))
        }
        Err(_) => {
            tracing::debug!(index, timeout_ms = timeout.as_millis(), "Fan-out call timed out");
            Envelope::Failed(FanoutError::Timeout(timeout))
        }
    }
}

/// Number of failed envelopes.
pub fn failure_count<T>(envelopes: &[Envelope<T>]) -> usize {
    envelopes.iter().filter(|e| !e.succeeded()).count()
}

/// Values of the successful envelopes, preserving input order.
pub fn successes<T>(envelopes: Vec<Envelope<T>>) -> Vec<T> {
    envelopes.into_iter().filter_map(Envelope::into_value).collect()
}

/// Flatten the successful list-valued envelopes, preserving input order.
pub fn flatten_successes<T>(envelopes: Vec<Envelope<Vec<T>>>) -> Vec<T> {
    successes(envelopes).into_iter().flatten().collect()
}

/// Drop later items whose key was already seen; first occurrence wins and
/// the relative order of survivors is kept.
pub fn dedup_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
