use glowsync_api::EntityId;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owns the task that listens to a source entity on behalf of a
/// switch. The task holds the upstream stream, so the host considers
/// the entity subscribed until the task ends.
///
/// `cancel()` consumes the handle. Dropping it without cancelling
/// still stops the task, but doesn't wait for it to finish.
pub struct Subscription {
    entity: EntityId,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(entity: EntityId, task: JoinHandle<()>) -> Self {
        Subscription {
            entity,
            task: Some(task),
        }
    }

    /// Stops the listener. When this returns, the task has been torn
    /// down and its upstream stream released.
    pub async fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();

            // The join result is either the cancellation we just
            // requested or the task having already ended. Neither
            // needs reporting.

            let _ = task.await;
            debug!("unsubscribed from {}", &self.entity);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort()
        }
    }
}
