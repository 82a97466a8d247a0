use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use brief_core::config::ReclaimPolicy;
use brief_core::{CapabilityKind, Error, FailureKind, Result};
use brief_inference::{reclaim_best_effort, InferenceRunner, MemoryReclaimer, ModelRegistry};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::scrapers::{validate_url, Scraper};

pub const PROMPT_TEMPLATE: &str =
    "Write a short Instagram post (max 3 sentences) about the topic: {topic}";

pub fn build_prompt(topic: &str) -> String {
    PROMPT_TEMPLATE.replace("{topic}", topic)
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Extracted,
    Inferred,
    Normalized,
    Done,
    Failed(FailureKind),
}

/// What the boundary layer renders when a request fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub type PipelineResult = std::result::Result<String, Failure>;

struct RequestTrace {
    capability: CapabilityKind,
    stage: Stage,
    inference_attempted: bool,
    started: Instant,
}

impl RequestTrace {
    fn new(capability: CapabilityKind) -> Self {
        Self {
            capability,
            stage: Stage::Received,
            inference_attempted: false,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(capability = %self.capability, from = ?self.stage, to = ?stage, "Pipeline transition");
        self.stage = stage;
    }
}

/// Turns a URL or topic into a rendered-ready string, or a [`Failure`].
///
/// Holds no per-request state; every call is independent.
pub struct RequestPipeline {
    registry: Arc<ModelRegistry>,
    scraper: Arc<dyn Scraper>,
    runner: InferenceRunner,
    reclaimer: Arc<dyn MemoryReclaimer>,
    reclaim_policy: ReclaimPolicy,
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("registry", &self.registry)
            .field("scraper", &self.scraper.name())
            .field("runner", &self.runner)
            .field("reclaimer", &self.reclaimer)
            .field("reclaim_policy", &self.reclaim_policy)
            .finish()
    }
}

impl RequestPipeline {
    pub fn new(
        registry: Arc<ModelRegistry>,
        scraper: Arc<dyn Scraper>,
        reclaimer: Arc<dyn MemoryReclaimer>,
        reclaim_policy: ReclaimPolicy,
    ) -> Self {
        Self {
            registry,
            scraper,
            runner: InferenceRunner::default(),
            reclaimer,
            reclaim_policy,
        }
    }

    pub fn with_runner(mut self, runner: InferenceRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn reclaim_policy(&self) -> ReclaimPolicy {
        self.reclaim_policy
    }

    /// Best-effort release of every capability's memory, independent of the policy.
    pub async fn reclaim_all(&self) {
        reclaim_best_effort(self.reclaimer.as_ref(), None).await;
    }

    pub async fn summarize(&self, url: &str) -> PipelineResult {
        let mut trace = RequestTrace::new(CapabilityKind::Summarize);
        let result = self.run_summarize(url.trim(), &mut trace).await;
        self.finish(trace, result).await
    }

    pub async fn generate(&self, topic: &str) -> PipelineResult {
        let mut trace = RequestTrace::new(CapabilityKind::Generate);
        let result = self.run_generate(topic.trim(), &mut trace).await;
        self.finish(trace, result).await
    }

    async fn run_summarize(&self, url: &str, trace: &mut RequestTrace) -> Result<String> {
        let model = self
            .registry
            .get(CapabilityKind::Summarize)
            .ok_or(Error::Unavailable(CapabilityKind::Summarize))?;

        validate_url(url)?;
        trace.advance(Stage::Validated);

        let extraction = self.scraper.scrape(url).await?;
        if extraction.combined_text.trim().is_empty() {
            return Err(Error::NoContent(url.to_string()));
        }
        trace.advance(Stage::Extracted);

        trace.inference_attempted = true;
        let summary = self
            .runner
            .summarize(model.as_ref(), &extraction.combined_text)
            .await?;
        trace.advance(Stage::Inferred);

        let summary = summary.trim().to_string();
        trace.advance(Stage::Normalized);
        Ok(summary)
    }

    async fn run_generate(&self, topic: &str, trace: &mut RequestTrace) -> Result<String> {
        let model = self
            .registry
            .get(CapabilityKind::Generate)
            .ok_or(Error::Unavailable(CapabilityKind::Generate))?;

        if topic.is_empty() {
            return Err(Error::EmptyTopic);
        }
        trace.advance(Stage::Validated);

        let prompt = build_prompt(topic);
        trace.inference_attempted = true;
        let post = self.runner.generate(model.as_ref(), &prompt).await?;
        trace.advance(Stage::Inferred);

        trace.advance(Stage::Normalized);
        Ok(post)
    }

    async fn finish(&self, mut trace: RequestTrace, result: Result<String>) -> PipelineResult {
        let elapsed_ms = elapsed_ms(trace.started.elapsed());

        match &result {
            Ok(output) => {
                trace.advance(Stage::Done);
                info!(capability = %trace.capability, elapsed_ms, output_len = output.len(), "Request completed");
            }
            Err(e) => {
                trace.advance(Stage::Failed(e.kind()));
                match e.kind() {
                    FailureKind::InvalidUrl | FailureKind::EmptyTopic | FailureKind::Unavailable => {
                        warn!(capability = %trace.capability, elapsed_ms, "Request rejected: {}", e)
                    }
                    _ => error!(capability = %trace.capability, elapsed_ms, "Request failed: {}", e),
                }
            }
        }

        if self.reclaim_policy == ReclaimPolicy::AfterInference && trace.inference_attempted {
            reclaim_best_effort(self.reclaimer.as_ref(), Some(trace.capability)).await;
        }

        result.map_err(|e| Failure::from(&e))
    }
}
