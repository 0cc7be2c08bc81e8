use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// The single keep-alive timer of a source.
///
/// Arming always cancels the previous timer first. Each arming gets a
/// sequence number; an expiry only counts if its sequence is still current,
/// which filters out a timer that fired while it was being replaced.
#[derive(Debug, Default)]
pub(crate) struct KeepAlive {
    timer: Option<JoinHandle<()>>,
    sequence: u64,
}

impl KeepAlive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer and schedule `on_expiry` after `deadline`.
    pub(crate) fn arm<F>(&mut self, runtime: &Handle, deadline: Duration, on_expiry: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.sequence += 1;
        let sequence = self.sequence;
        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(deadline).await;
            on_expiry(sequence);
        }));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Claim the expiry of timer `sequence`.
    ///
    /// Returns false when that timer has since been replaced or cancelled.
    pub(crate) fn expire(&mut self, sequence: u64) -> bool {
        if self.timer.is_some() && self.sequence == sequence {
            // The task is finishing on its own; dropping the handle detaches it.
            self.timer = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.cancel();
    }
}
