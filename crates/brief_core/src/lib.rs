pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, FailureKind, Result};
pub use models::InferenceModel;
pub use types::{
    CapabilityKind, Device, ExtractionResult, InferenceParams, InferenceRequest, ModelSpec,
    Precision,
};
