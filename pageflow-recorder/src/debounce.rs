use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Trailing-edge rate limiter
///
/// Every `call` re-arms the timer with the new value; the action runs once
/// with the most recent value after the window elapses without another
/// call. `cancel` aborts a pending run outright, so a stale limiter can
/// never fire after teardown.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    action: Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            action: Arc::new(move |value| -> BoxFuture<'static, ()> { Box::pin(action(value)) }),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Re-arm the window with a fresh value; the previous pending run is
    /// discarded
    pub fn call(&self, value: T) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(value).await;
        });

        let previous = self.pending.lock().unwrap().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Abort any pending run
    pub fn cancel(&self) {
        let pending = self.pending.lock().unwrap().take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
