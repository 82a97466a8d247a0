use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brief_core::config::{BackendConfig, BackendKind};
use brief_core::{CapabilityKind, Error, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::ollama::normalize_base_url;

/// Releases memory held by the model runtime after heavy calls.
///
/// Implementations must be idempotent and safe to call from many tasks at once.
#[async_trait]
pub trait MemoryReclaimer: Send + Sync + fmt::Debug {
    /// Release what the model serving `kind` holds; other capabilities stay resident.
    async fn reclaim(&self, kind: CapabilityKind) -> Result<()>;

    /// Release every capability, reporting the first failure.
    async fn reclaim_all(&self) -> Result<()> {
        let mut first_error = None;
        for kind in CapabilityKind::ALL {
            if let Err(e) = self.reclaim(kind).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Used when the backend keeps no reclaimable memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReclaimer;

#[async_trait]
impl MemoryReclaimer for NoopReclaimer {
    async fn reclaim(&self, _kind: CapabilityKind) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct UnloadRequest<'a> {
    model: &'a str,
    keep_alive: u32,
}

/// Asks an Ollama server to unload models, freeing their accelerator and host memory.
pub struct OllamaReclaimer {
    client: Client,
    base_url: String,
    models: Vec<(CapabilityKind, String)>,
}

impl fmt::Debug for OllamaReclaimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaReclaimer")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish()
    }
}

impl OllamaReclaimer {
    /// `models` pairs each loaded capability with its backend model name.
    pub fn new(backend: &BackendConfig, models: Vec<(CapabilityKind, String)>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&backend.base_url)?,
            models,
        })
    }

    async fn unload(&self, model: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&UnloadRequest {
                model,
                keep_alive: 0,
            })
            .send()
            .await
            .map_err(|e| Error::External(anyhow::anyhow!("Failed to unload {}: {}", model, e)))?;

        if !response.status().is_success() {
            return Err(Error::External(anyhow::anyhow!(
                "Failed to unload {}: status {}",
                model,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryReclaimer for OllamaReclaimer {
    async fn reclaim(&self, kind: CapabilityKind) -> Result<()> {
        let mut first_error = None;
        for (_, model) in self.models.iter().filter(|(owner, _)| *owner == kind) {
            debug!(capability = %kind, model = %model, "Unloading model");
            if let Err(e) = self.unload(model).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Pick the reclaimer matching the backend.
pub fn create_reclaimer(
    backend: &BackendConfig,
    models: Vec<(CapabilityKind, String)>,
) -> Result<Arc<dyn MemoryReclaimer>> {
    match backend.kind {
        BackendKind::Ollama => Ok(Arc::new(OllamaReclaimer::new(backend, models)?)),
        BackendKind::Dummy => Ok(Arc::new(NoopReclaimer)),
    }
}

/// Run `reclaimer` for one capability, or all of them when `kind` is `None`,
/// and swallow its failure; memory release never fails a request.
pub async fn reclaim_best_effort(reclaimer: &dyn MemoryReclaimer, kind: Option<CapabilityKind>) {
    let result = match kind {
        Some(kind) => reclaimer.reclaim(kind).await,
        None => reclaimer.reclaim_all().await,
    };
    match result {
        Ok(()) => debug!(capability = ?kind, "Memory reclaimed"),
        Err(e) => warn!(capability = ?kind, "Memory reclamation failed: {}", e),
    }
}
