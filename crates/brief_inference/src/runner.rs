use brief_core::{Error, InferenceModel, InferenceParams, InferenceRequest, Result};
use tracing::{debug, error};

/// Calls a loaded capability with fixed decoding bounds and normalizes its output.
#[derive(Debug, Clone)]
pub struct InferenceRunner {
    summarize_params: InferenceParams,
    generate_params: InferenceParams,
}

impl Default for InferenceRunner {
    fn default() -> Self {
        Self {
            summarize_params: InferenceParams::SUMMARIZE,
            generate_params: InferenceParams::GENERATE,
        }
    }
}

impl InferenceRunner {
    pub fn new(summarize_params: InferenceParams, generate_params: InferenceParams) -> Self {
        Self {
            summarize_params,
            generate_params,
        }
    }

    pub async fn summarize(&self, model: &dyn InferenceModel, text: &str) -> Result<String> {
        let request = InferenceRequest::summarize(text).with_params(self.summarize_params);
        let raw = self.invoke(model, &request).await?;

        let summary = raw.trim();
        if summary.is_empty() {
            return Err(Error::Inference("The model returned an empty summary".to_string()));
        }
        Ok(summary.to_string())
    }

    pub async fn generate(&self, model: &dyn InferenceModel, prompt: &str) -> Result<String> {
        let request = InferenceRequest::generate(prompt).with_params(self.generate_params);
        let raw = self.invoke(model, &request).await?;

        first_line(&raw).ok_or_else(|| {
            Error::Inference("The model returned an empty generation".to_string())
        })
    }

    async fn invoke(&self, model: &dyn InferenceModel, request: &InferenceRequest) -> Result<String> {
        debug!(
            capability = %request.capability,
            backend = model.name(),
            max_length = request.params.max_length,
            "Running inference"
        );

        model.infer(request).await.map_err(|e| {
            error!(capability = %request.capability, backend = model.name(), "Inference failed: {}", e);
            match e {
                Error::Inference(message) => Error::Inference(message),
                other => Error::Inference(other.to_string()),
            }
        })
    }
}

/// First non-blank line of `raw`, trimmed.
pub fn first_line(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
