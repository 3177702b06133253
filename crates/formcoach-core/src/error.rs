//! Error types for the FormCoach system.

use thiserror::Error;

use crate::types::Landmark;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid frame: expected {expected} keypoints, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error("Landmark not detected: {0:?}")]
    MissingLandmark(Landmark),

    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
