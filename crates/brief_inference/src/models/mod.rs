use std::sync::Arc;

use brief_core::config::{BackendConfig, BackendKind, LoadMode};
use brief_core::{CapabilityKind, InferenceModel, ModelSpec, Result};

pub mod dummy;
pub mod ollama;

pub use dummy::DummyModel;
pub use ollama::OllamaModel;

/// Construct the model backing one capability.
pub async fn create_model(
    kind: CapabilityKind,
    spec: &ModelSpec,
    backend: &BackendConfig,
    mode: LoadMode,
) -> Result<Arc<dyn InferenceModel>> {
    match backend.kind {
        BackendKind::Ollama => {
            let model = OllamaModel::load(kind, spec, backend, mode).await?;
            Ok(Arc::new(model))
        }
        BackendKind::Dummy => Ok(Arc::new(DummyModel::new(kind))),
    }
}
