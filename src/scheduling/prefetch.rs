//! Prefetch: start a slow, independent task early and join it later
//!
//! The task runs as a detached tokio task from the moment it is started.
//! `join` memoizes the first outcome, so joining twice (or after the task
//! already finished) returns the same result without running it again.

use futures::FutureExt;
use std::future::Future;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;

/// Why a prefetched task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefetchError {
    #[error("prefetch task failed: {0}")]
    Failed(String),
    #[error("prefetch task panicked: {0}")]
    Panicked(String),
    #[error("prefetch task was cancelled")]
    Cancelled,
}

/// Handle to one prefetched task.
pub struct PrefetchHandle<T> {
    task: Mutex<Option<JoinHandle<Result<T, String>>>>,
    outcome: OnceCell<Result<T, PrefetchError>>,
}

impl<T> PrefetchHandle<T>
where
    T: Clone + Send + 'static,
{
    /// Spawn `task` in the background. Must be called inside a tokio runtime.
    pub fn start<F>(task: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let handle = tokio::spawn(task.map(|r| r.map_err(|e| format!("{e:#}"))));
        Self {
            task: Mutex::new(Some(handle)),
            outcome: OnceCell::new(),
        }
    }

    /// Wait for the task and return its (memoized) result.
    pub async fn join(&self) -> Result<T, PrefetchError> {
        self.outcome
            .get_or_init(|| async {
                // The handle stays in place while awaited, so a join that is
                // dropped midway leaves it for the next caller.
                let mut task = self.task.lock().await;
                let Some(handle) = task.as_mut() else {
                    return Err(PrefetchError::Cancelled);
                };
                let joined = handle.await;
                *task = None;
                match joined {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(message)) => Err(PrefetchError::Failed(message)),
                    Err(e) if e.is_panic() => Err(PrefetchError::Panicked(e.to_string())),
                    Err(_) => Err(PrefetchError::Cancelled),
                }
            })
            .await
            .clone()
    }

    /// True once the background task has settled (joined or not).
    pub fn is_settled(&self) -> bool {
        if self.outcome.initialized() {
            return true;
        }
        // Locked means a join is awaiting the task right now.
        self.task
            .try_lock()
            .is_ok_and(|task| task.as_ref().map_or(true, JoinHandle::is_finished))
    }
}

impl<T> Drop for PrefetchHandle<T> {
    fn drop(&mut self) {
        // Abandoned prefetches should not outlive their run.
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

impl<T> std::fmt::Debug for PrefetchHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchHandle")
            .field("joined", &self.outcome.initialized())
            .finish_non_exhaustive()
    }
}
