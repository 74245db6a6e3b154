use thiserror::Error;

use crate::field::GameState;
use crate::mixer::Branch;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid game state: down={down}, distance={distance}, yardline={yardline}")]
    InvalidState { down: u8, distance: u8, yardline: u8 },

    #[error("Invalid down-distance key: {0}")]
    InvalidKey(String),

    #[error("Invalid yardline bucket: {0}")]
    InvalidBucket(String),

    #[error("Invalid CDF for {key}: {reason}")]
    InvalidCdf { key: String, reason: String },

    #[error("No prior value for {state}")]
    MissingPrior { state: GameState },

    #[error("Cycle reached {state} but the prior table has no entry for it")]
    CycleWithoutPrior { state: GameState },

    #[error("{branch:?} value {value} at {state} exceeds plausible bounds")]
    Diverged {
        state: GameState,
        branch: Option<Branch>,
        value: f64,
    },

    #[error("Normative policy requires a decision frequency table")]
    MissingDecisions,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Errors caused by the loaded tables rather than by engine arithmetic.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidKey(_)
                | EngineError::InvalidBucket(_)
                | EngineError::InvalidCdf { .. }
                | EngineError::MissingPrior { .. }
                | EngineError::CycleWithoutPrior { .. }
                | EngineError::MissingDecisions
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
