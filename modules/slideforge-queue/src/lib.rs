use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// In-process FIFO of job ids. See spec §4.4.
///
/// Non-blocking enqueue that cannot fail under normal load (the channel
/// is unbounded); exactly one dequeuer is expected, though the sender
/// half may be cloned by any number of enqueuers.
#[derive(Clone)]
pub struct JobQueueHandle {
    sender: mpsc::UnboundedSender<String>,
}

impl JobQueueHandle {
    /// Enqueues `job_id`. Never blocks, never fails under normal
    /// operation; only errors if every receiver has already been
    /// dropped, which only happens during shutdown.
    pub fn enqueue(&self, job_id: impl Into<String>) -> Result<(), String> {
        self.sender
            .send(job_id.into())
            .map_err(|e| format!("job queue is closed: {}", e.0))
    }
}

pub struct JobQueueReceiver {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl JobQueueReceiver {
    /// Dequeues the next job id, honoring cooperative cancellation. See
    /// spec §4.4/§5. Returns `None` when the queue is closed or
    /// cancellation fires first.
    pub async fn dequeue(&mut self, cancellation: &CancellationToken) -> Option<String> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => None,
            job_id = self.receiver.recv() => job_id,
        }
    }
}

/// Builds a connected sender/receiver pair.
pub fn job_queue() -> (JobQueueHandle, JobQueueReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobQueueHandle { sender }, JobQueueReceiver { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dequeues_in_fifo_order() {
        let (handle, mut receiver) = job_queue();
        handle.enqueue("a").unwrap();
        handle.enqueue("b").unwrap();
        handle.enqueue("c").unwrap();

        let cancellation = CancellationToken::new();
        assert_eq!(receiver.dequeue(&cancellation).await, Some("a".to_string()));
        assert_eq!(receiver.dequeue(&cancellation).await, Some("b".to_string()));
        assert_eq!(receiver.dequeue(&cancellation).await, Some("c".to_string()));
    }

    #[tokio::test]
    async fn cancellation_unblocks_dequeue() {
        let (_handle, mut receiver) = job_queue();
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        assert_eq!(receiver.dequeue(&cancellation).await, None);
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_errors() {
        let (handle, receiver) = job_queue();
        drop(receiver);
        assert!(handle.enqueue("a").is_err());
    }
}
