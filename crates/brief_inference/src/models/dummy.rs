use std::fmt;

use brief_core::{CapabilityKind, Error, InferenceModel, InferenceRequest, Result};

/// Deterministic in-process model for offline runs.
///
/// Summaries are the leading words of the input; generations append a
/// continuation line so first-line trimming is exercised.
pub struct DummyModel {
    kind: CapabilityKind,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").field("kind", &self.kind).finish()
    }
}

impl DummyModel {
    pub fn new(kind: CapabilityKind) -> Self {
        Self { kind }
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn infer(&self, request: &InferenceRequest) -> Result<String> {
        if request.capability != self.kind {
            return Err(Error::Inference(format!(
                "{} model cannot serve a {} request",
                self.kind, request.capability
            )));
        }

        let limit = (request.params.max_length as usize).min(20);
        let words: Vec<&str> = request.input.split_whitespace().take(limit).collect();

        Ok(match request.capability {
            CapabilityKind::Summarize => words.join(" "),
            CapabilityKind::Generate => {
                format!("{}\n#dummy #offline", words.join(" "))
            }
        })
    }
}
