use thiserror::Error;

/// Errors raised by the game core.
///
/// Every variant is produced before any state is touched, so a failed action
/// leaves the session exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("'{0}' has already been guessed")]
    DuplicateGuess(String),

    #[error("all {max} hints have been used")]
    HintExhausted { max: u32 },

    #[error("hints unlock once {threshold} or fewer attempts remain ({remaining} left)")]
    HintNotYetAvailable { threshold: u32, remaining: u32 },

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, GameError>;
