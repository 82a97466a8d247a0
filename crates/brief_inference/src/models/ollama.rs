use std::fmt;

use brief_core::config::{BackendConfig, LoadMode};
use brief_core::{
    CapabilityKind, Device, Error, InferenceModel, InferenceParams, InferenceRequest, ModelSpec,
    Result,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Ollama `/api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub(crate) struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_gpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_gpu: Option<u32>,
}

impl OllamaOptions {
    pub(crate) fn new(device: Device, params: Option<&InferenceParams>) -> Self {
        let mut options = match device {
            Device::Cpu => Self {
                num_gpu: Some(0),
                ..Default::default()
            },
            Device::Gpu(index) => Self {
                main_gpu: Some(index),
                ..Default::default()
            },
        };

        if let Some(params) = params {
            options.num_predict = Some(params.max_length);
            if params.do_sample {
                options.temperature = params.temperature;
            } else {
                // Greedy decoding
                options.temperature = Some(0.0);
                options.top_k = Some(1);
            }
        }

        options
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

/// A capability served by an Ollama-compatible server.
pub struct OllamaModel {
    client: Client,
    base_url: String,
    kind: CapabilityKind,
    spec: ModelSpec,
    reference: String,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("kind", &self.kind)
            .field("reference", &self.reference)
            .field("device", &self.spec.device)
            .finish()
    }
}

impl OllamaModel {
    /// Verify the model exists on the server and, in eager mode, load it into memory.
    pub async fn load(
        kind: CapabilityKind,
        spec: &ModelSpec,
        backend: &BackendConfig,
        mode: LoadMode,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&backend.base_url)?;
        let client = Client::builder()
            .timeout(backend.timeout())
            .build()
            .map_err(|e| Error::ModelLoad(format!("Failed to build HTTP client: {}", e)))?;

        let model = Self {
            client,
            base_url,
            kind,
            spec: spec.clone(),
            reference: spec.reference(),
        };

        model.verify().await?;
        if mode == LoadMode::Eager {
            model.warm_up().await?;
        }

        info!(
            capability = %kind,
            model = %model.reference,
            device = %spec.device,
            mode = ?mode,
            "Ollama model ready"
        );

        Ok(model)
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn verify(&self) -> Result<()> {
        let response = self
            .client
            .post(self.api_url("show"))
            .json(&ShowRequest {
                model: &self.reference,
            })
            .send()
            .await
            .map_err(|e| {
                Error::ModelLoad(format!(
                    "Ollama is not reachable at {}: {}. Please ensure Ollama is running.",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelLoad(format!(
                "Model '{}' is not installed (status {}): {}",
                self.reference, status, body
            )));
        }

        Ok(())
    }

    /// An empty prompt makes Ollama load the weights without generating.
    async fn warm_up(&self) -> Result<()> {
        let body = GenerateRequest {
            model: &self.reference,
            prompt: "",
            system: None,
            stream: false,
            options: Some(OllamaOptions::new(self.spec.device, None)),
        };

        let response = self
            .client
            .post(self.api_url("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ModelLoad(format!("Failed to load '{}': {}", self.reference, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelLoad(format!(
                "Failed to load '{}' (status {}): {}",
                self.reference, status, body
            )));
        }

        Ok(())
    }

    fn system_prompt(&self, params: &InferenceParams) -> Option<String> {
        match self.kind {
            CapabilityKind::Summarize => Some(match params.min_length {
                Some(min) => format!(
                    "Summarize the following text in {} to {} words. Reply with the summary only.",
                    min, params.max_length
                ),
                None => format!(
                    "Summarize the following text in at most {} words. Reply with the summary only.",
                    params.max_length
                ),
            }),
            CapabilityKind::Generate => None,
        }
    }
}

#[async_trait::async_trait]
impl InferenceModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    #[instrument(skip(self, request), fields(capability = %request.capability, model = %self.reference))]
    async fn infer(&self, request: &InferenceRequest) -> Result<String> {
        if request.capability != self.kind {
            return Err(Error::Inference(format!(
                "{} model cannot serve a {} request",
                self.kind, request.capability
            )));
        }
        if request.params.num_return_sequences != 1 {
            return Err(Error::Inference(format!(
                "Ollama returns a single sequence, {} were requested",
                request.params.num_return_sequences
            )));
        }

        let body = GenerateRequest {
            model: &self.reference,
            prompt: &request.input,
            system: self.system_prompt(&request.params),
            stream: false,
            options: Some(OllamaOptions::new(self.spec.device, Some(&request.params))),
        };

        debug!(input_len = request.input.len(), "Sending request to Ollama");

        let response = self
            .client
            .post(self.api_url("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Inference(format!("Model call timed out: {}", e))
                } else {
                    Error::Inference(format!("Model call failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Inference request failed");
            return Err(Error::Inference(format!("Status {}: {}", status, body)));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Invalid response: {}", e)))?;

        debug!(tokens = ?generated.eval_count, "Inference completed");
        Ok(generated.response)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid backend URL '{}': {}", raw, e)))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
