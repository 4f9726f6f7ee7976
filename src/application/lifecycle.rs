//! Teardown signal for views that start asynchronous work.
//!
//! A view owns a [`ViewLifecycle`] and passes it to every async call it
//! makes. Once the view is torn down, pending calls resolve to
//! [`StorefrontError::Cancelled`] and their results are never delivered.

use crate::domain::{Result, StorefrontError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct ViewLifecycle {
    torn_down: Arc<watch::Sender<bool>>,
}

impl Default for ViewLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewLifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            torn_down: Arc::new(tx),
        }
    }

    /// Fire the teardown signal. Idempotent.
    pub fn teardown(&self) {
        self.torn_down.send_replace(true);
    }

    pub fn is_torn_down(&self) -> bool {
        *self.torn_down.borrow()
    }

    /// Resolves once the view has been torn down.
    pub async fn torn_down(&self) {
        let mut rx = self.torn_down.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|torn_down| *torn_down).await;
    }

    /// Run `work` on behalf of the view.
    ///
    /// Returns `Cancelled` without polling `work` if the view is already gone,
    /// drops `work` as soon as the view is torn down, and re-checks before
    /// handing back a result.
    pub async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_torn_down() {
            return Err(StorefrontError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = self.torn_down() => return Err(StorefrontError::Cancelled),
            result = work => result,
        };

        if self.is_torn_down() {
            return Err(StorefrontError::Cancelled);
        }
        result
    }
}
