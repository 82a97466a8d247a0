use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use brief_core::config::{BackendConfig, ModelsConfig};
use brief_core::{CapabilityKind, InferenceModel, ModelSpec, Result};
use futures::future::join_all;
use tracing::{error, info};

use crate::models::create_model;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityStatus {
    Loaded,
    Unavailable(String),
}

impl CapabilityStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, CapabilityStatus::Loaded)
    }
}

enum Slot {
    Loaded(Arc<dyn InferenceModel>),
    Unavailable(String),
}

/// One named capability, resolved once at startup.
pub struct Capability {
    kind: CapabilityKind,
    spec: Option<ModelSpec>,
    slot: Slot,
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("kind", &self.kind)
            .field("spec", &self.spec)
            .field("status", &self.status())
            .finish()
    }
}

impl Capability {
    fn from_load_result(
        kind: CapabilityKind,
        spec: Option<ModelSpec>,
        result: Result<Arc<dyn InferenceModel>>,
    ) -> Self {
        let model_name = spec.as_ref().map_or_else(String::new, ModelSpec::reference);
        let slot = match result {
            Ok(model) => {
                info!(capability = %kind, model = %model_name, backend = model.name(), "Model loaded successfully");
                Slot::Loaded(model)
            }
            Err(e) => {
                error!(capability = %kind, model = %model_name, "Failed to load model: {}", e);
                Slot::Unavailable(e.to_string())
            }
        };

        Self { kind, spec, slot }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn spec(&self) -> Option<&ModelSpec> {
        self.spec.as_ref()
    }

    pub fn status(&self) -> CapabilityStatus {
        match &self.slot {
            Slot::Loaded(_) => CapabilityStatus::Loaded,
            Slot::Unavailable(reason) => CapabilityStatus::Unavailable(reason.clone()),
        }
    }

    pub fn model(&self) -> Option<Arc<dyn InferenceModel>> {
        match &self.slot {
            Slot::Loaded(model) => Some(Arc::clone(model)),
            Slot::Unavailable(_) => None,
        }
    }
}

/// Owns every capability. A failed load only disables its own capability.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    capabilities: HashMap<CapabilityKind, Capability>,
}

impl ModelRegistry {
    /// Load all capabilities concurrently. Never fails; failures become `Unavailable`.
    pub async fn initialize(models: &ModelsConfig, backend: &BackendConfig) -> Self {
        let loads = CapabilityKind::ALL.into_iter().map(|kind| async move {
            let spec = models.spec(kind).clone();
            let result = create_model(kind, &spec, backend, models.load).await;
            Capability::from_load_result(kind, Some(spec), result)
        });

        let capabilities = join_all(loads)
            .await
            .into_iter()
            .map(|capability| (capability.kind, capability))
            .collect();

        Self { capabilities }
    }

    /// Build from explicit load outcomes, e.g. mock models in tests.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CapabilityKind, Result<Arc<dyn InferenceModel>>)>,
    {
        let capabilities = entries
            .into_iter()
            .map(|(kind, result)| (kind, Capability::from_load_result(kind, None, result)))
            .collect();

        Self { capabilities }
    }

    pub fn get(&self, kind: CapabilityKind) -> Option<Arc<dyn InferenceModel>> {
        self.capabilities.get(&kind).and_then(Capability::model)
    }

    /// Capabilities that were never configured report as unavailable.
    pub fn status(&self, kind: CapabilityKind) -> CapabilityStatus {
        self.capabilities
            .get(&kind)
            .map(Capability::status)
            .unwrap_or_else(|| CapabilityStatus::Unavailable("not configured".to_string()))
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        CapabilityKind::ALL
            .iter()
            .filter_map(|kind| self.capabilities.get(kind))
    }

    /// Each loaded capability with its backend model name.
    pub fn loaded_models(&self) -> Vec<(CapabilityKind, String)> {
        self.capabilities()
            .filter(|c| c.status().is_loaded())
            .filter_map(|c| c.spec().map(|spec| (c.kind(), spec.reference())))
            .collect()
    }
}
