use crate::event::EventId;
use thiserror::Error;

pub type ProgramResult<T> = Result<T, ProgramError>;

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("unknown event: {0}")]
    UnknownEvent(EventId),

    #[error("cannot apply remedy to {event}: {reason}")]
    InvalidRemedy { event: EventId, reason: String },
}
