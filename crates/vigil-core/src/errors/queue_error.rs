/// Durable task-queue errors.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("broker unavailable: {reason}")]
    BrokerUnavailable { reason: String },

    #[error("task {task_id} not found")]
    TaskNotFound { task_id: String },
}

impl QueueError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::BrokerUnavailable { .. })
    }
}
