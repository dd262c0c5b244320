use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The registry is sealed once the loop has been started.
    #[error("Timer loop is already running")]
    AlreadyRunning,

    /// A job with the same id is already registered.
    #[error("Duplicate job id: {id}")]
    DuplicateJob { id: String },

    /// Entry intervals must be strictly positive.
    #[error("Job {id} has a zero interval")]
    InvalidInterval { id: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
