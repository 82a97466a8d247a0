use std::fmt;

use async_trait::async_trait;

use crate::types::InferenceRequest;
use crate::Result;

/// A loaded model able to serve one capability.
///
/// Handles are shared read-only across requests, so implementations must be
/// safe to call concurrently.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Run the model on `request.input` and return its raw text output.
    async fn infer(&self, request: &InferenceRequest) -> Result<String>;
}
