use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElectionError {
    /// The coordination service could not be reached at bootstrap.
    #[error("Coordination backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with something that is not a leader record.
    #[error("Bad response from coordination backend: {0}")]
    BadResponse(String),
}

pub type Result<T> = std::result::Result<T, ElectionError>;
