use std::time::Duration;

use tokio::task::JoinHandle;

/// A cancellable deferred callback.
///
/// At most one callback is pending: scheduling a new one cancels the previous.
/// Dropping the timer cancels whatever is pending.
#[derive(Default)]
pub struct DisplayTimer {
    handle: Option<JoinHandle<()>>,
}

impl DisplayTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire();
        }));
    }

    /// Returns whether a callback was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DisplayTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
