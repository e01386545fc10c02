use thiserror::Error;

use crate::thread::ThreadId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("Thread {0} is already running")]
    Conflict(ThreadId),

    #[error("Thread {0} not found")]
    NotFound(ThreadId),
}
