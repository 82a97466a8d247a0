use serde::Serialize;
use thiserror::Error;

use crate::types::CapabilityKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The {} model is not available", .0.label())]
    Unavailable(CapabilityKind),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Please provide a topic")]
    EmptyTopic,

    #[error("Failed to fetch page: {0}")]
    FetchFailed(String),

    #[error("No text found to analyze at {0}")]
    NoContent(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

/// Coarse failure classes reported to the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    InvalidUrl,
    EmptyTopic,
    FetchFailed,
    NoContent,
    InferenceError,
    Internal,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Unavailable(_) => FailureKind::Unavailable,
            Error::InvalidUrl(_) => FailureKind::InvalidUrl,
            Error::EmptyTopic => FailureKind::EmptyTopic,
            Error::FetchFailed(_) => FailureKind::FetchFailed,
            Error::NoContent(_) => FailureKind::NoContent,
            Error::Inference(_) => FailureKind::InferenceError,
            Error::ModelLoad(_) | Error::Config(_) | Error::External(_) => FailureKind::Internal,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
