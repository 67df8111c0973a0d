use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    /// The completion service could not be reached or answered with an
    /// unexpected status.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    #[error("completion service rate limit exceeded")]
    RateLimited,

    #[error("completion service quota exhausted")]
    QuotaExceeded,

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The medication schedule could not be read.
    #[error("failed to load medication context: {0}")]
    Context(String),
}
