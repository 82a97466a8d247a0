//! End-to-end pipeline tests: mocked pages, scripted models.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use brief_core::config::{EmptyTextPolicy, FetchConfig, ReclaimPolicy, DEFAULT_USER_AGENT};
use brief_core::{CapabilityKind, Error, FailureKind, InferenceModel, InferenceRequest, Result};
use brief_inference::{MemoryReclaimer, ModelRegistry};
use brief_scraper::{LeadTextScraper, RequestPipeline};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[derive(Debug, Default)]
struct RecordingModel {
    output: String,
    fail: bool,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl RecordingModel {
    fn returning(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            ..Default::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_input(&self) -> String {
        self.requests.lock().unwrap().last().unwrap().input.clone()
    }
}

#[async_trait]
impl InferenceModel for RecordingModel {
    fn name(&self) -> &str {
        "Recording"
    }

    async fn infer(&self, request: &InferenceRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::Inference("model runtime crashed".to_string()));
        }
        Ok(self.output.clone())
    }
}

#[derive(Debug, Default)]
struct CountingReclaimer {
    calls: AtomicUsize,
    kinds: Mutex<Vec<CapabilityKind>>,
}

impl CountingReclaimer {
    fn kinds(&self) -> Vec<CapabilityKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryReclaimer for CountingReclaimer {
    async fn reclaim(&self, kind: CapabilityKind) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds.lock().unwrap().push(kind);
        Err(Error::External(anyhow::anyhow!("reclaim is best effort")))
    }
}

struct Harness {
    pipeline: RequestPipeline,
    summarizer: Arc<RecordingModel>,
    generator: Arc<RecordingModel>,
    reclaimer: Arc<CountingReclaimer>,
}

fn harness_with(
    summarizer: Option<Arc<RecordingModel>>,
    generator: Option<Arc<RecordingModel>>,
    empty_text: EmptyTextPolicy,
) -> Harness {
    let summarizer_handle = summarizer.clone().unwrap_or_default();
    let generator_handle = generator.clone().unwrap_or_default();

    let entry = |kind: CapabilityKind, model: Option<Arc<RecordingModel>>| {
        let result: Result<Arc<dyn InferenceModel>> = match model {
            Some(model) => Ok(model as Arc<dyn InferenceModel>),
            None => Err(Error::ModelLoad(format!("{} weights missing", kind))),
        };
        (kind, result)
    };

    let registry = ModelRegistry::from_entries([
        entry(CapabilityKind::Summarize, summarizer),
        entry(CapabilityKind::Generate, generator),
    ]);

    let scraper = LeadTextScraper::new(&FetchConfig {
        empty_text,
        ..Default::default()
    })
    .unwrap();
    let reclaimer = Arc::new(CountingReclaimer::default());

    Harness {
        pipeline: RequestPipeline::new(
            Arc::new(registry),
            Arc::new(scraper),
            reclaimer.clone(),
            ReclaimPolicy::AfterInference,
        ),
        summarizer: summarizer_handle,
        generator: generator_handle,
        reclaimer,
    }
}

fn harness() -> Harness {
    harness_with(
        Some(RecordingModel::returning("A concise summary.")),
        Some(RecordingModel::returning("Coffee first, questions later. ☕\nSecond line.")),
        EmptyTextPolicy::Reject,
    )
}

async fn serve_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn summarizes_first_three_paragraphs() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/article",
        "<html><body><p>A.</p><p>B.</p><p>C.</p><p>D.</p></body></html>",
    )
    .await;
    let h = harness();

    let summary = h
        .pipeline
        .summarize(&format!("{}/article", server.uri()))
        .await
        .unwrap();

    assert_eq!(summary, "A concise summary.");
    assert_eq!(h.summarizer.calls(), 1);
    assert_eq!(h.summarizer.last_input(), "A. B. C.");
    let request = h.summarizer.requests.lock().unwrap()[0].clone();
    assert_eq!(request.params.max_length, 130);
    assert_eq!(request.params.min_length, Some(30));
    assert_eq!(h.reclaimer.kinds(), vec![CapabilityKind::Summarize]);
}

#[tokio::test]
async fn fetch_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .and(|request: &Request| {
            request
                .headers
                .get("user-agent")
                .and_then(|value| value.to_str().ok())
                == Some(DEFAULT_USER_AGENT)
        })
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Hello.</p>"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness();

    h.pipeline
        .summarize(&format!("{}/article", server.uri()))
        .await
        .unwrap();
    assert_eq!(h.summarizer.last_input(), "Hello.");
}

#[tokio::test]
async fn invalid_url_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>x</p>"))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness();

    let host = server.address().to_string();
    for url in [host.as_str(), "ftp://example.com/file", "", "   ", "javascript:alert(1)"] {
        let failure = h.pipeline.summarize(url).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidUrl, "url {:?}", url);
    }

    assert_eq!(h.summarizer.calls(), 0);
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unavailable_summarizer_skips_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>x</p>"))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness_with(
        None,
        Some(RecordingModel::returning("Post")),
        EmptyTextPolicy::Reject,
    );

    let failure = h
        .pipeline
        .summarize(&format!("{}/article", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Unavailable);
    assert_eq!(failure.message, "The summarization model is not available");

    // Generation is unaffected
    assert_eq!(h.pipeline.generate("coffee").await.unwrap(), "Post");
}

#[tokio::test]
async fn unavailable_generator_rejects_any_topic() {
    let h = harness_with(
        Some(RecordingModel::returning("Summary")),
        None,
        EmptyTextPolicy::Reject,
    );

    for topic in ["coffee", "", "   "] {
        let failure = h.pipeline.generate(topic).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unavailable);
    }
}

#[tokio::test]
async fn fetch_failures_are_reported_distinctly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let h = harness();

    let failure = h
        .pipeline
        .summarize(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::FetchFailed);
    assert!(failure.message.contains("404"));

    let failure = h.pipeline.summarize("http://127.0.0.1:9/closed").await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::FetchFailed);

    assert_eq!(h.summarizer.calls(), 0);
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_page_policies() {
    let server = MockServer::start().await;
    serve_page(&server, "/empty", "<html><body><div>Only a div</div><p> </p></body></html>").await;
    let url = format!("{}/empty", server.uri());

    let rejecting = harness();
    let failure = rejecting.pipeline.summarize(&url).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::NoContent);
    assert_eq!(rejecting.summarizer.calls(), 0);

    let placeholder = harness_with(
        Some(RecordingModel::returning("Nothing to see.")),
        None,
        EmptyTextPolicy::Placeholder,
    );
    let summary = placeholder.pipeline.summarize(&url).await.unwrap();
    assert_eq!(summary, "Nothing to see.");
    let input = placeholder.summarizer.last_input();
    assert!(!input.trim().is_empty());
    assert_eq!(input, brief_core::types::PLACEHOLDER_TEXT);
}

#[tokio::test]
async fn inference_failure_is_contained_and_reclaimed() {
    let server = MockServer::start().await;
    serve_page(&server, "/article", "<p>Some text.</p>").await;
    let h = harness_with(Some(RecordingModel::failing()), None, EmptyTextPolicy::Reject);

    let failure = h
        .pipeline
        .summarize(&format!("{}/article", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::InferenceError);
    assert!(failure.message.contains("model runtime crashed"));
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_requests_are_independent() {
    let server = MockServer::start().await;
    serve_page(&server, "/article", "<p>A.</p><p>B.</p><p>C.</p>").await;
    let h = harness();
    let url = format!("{}/article", server.uri());

    let first = h.pipeline.summarize(&url).await.unwrap();
    let second = h.pipeline.summarize(&url).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.summarizer.calls(), 2);
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn generates_first_line_from_fixed_prompt() {
    let h = harness();

    let post = h.pipeline.generate("  coffee  ").await.unwrap();

    assert_eq!(post, "Coffee first, questions later. ☕");
    assert!(!post.contains('\n'));
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(
        h.generator.last_input(),
        "Write a short Instagram post (max 3 sentences) about the topic: coffee"
    );
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generate_leaves_summarizer_resident() {
    let h = harness();

    h.pipeline.generate("coffee").await.unwrap();
    h.pipeline.generate("tea").await.unwrap();

    assert_eq!(
        h.reclaimer.kinds(),
        vec![CapabilityKind::Generate, CapabilityKind::Generate]
    );
}

#[tokio::test]
async fn blank_topic_skips_inference() {
    let h = harness();

    for topic in ["", "   ", "\n\t"] {
        let failure = h.pipeline.generate(topic).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::EmptyTopic);
        assert_eq!(failure.message, "Please provide a topic");
    }

    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.reclaimer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reclaim_policy_off_never_reclaims() {
    let registry = ModelRegistry::from_entries([(
        CapabilityKind::Generate,
        Ok(RecordingModel::returning("Hi") as Arc<dyn InferenceModel>),
    )]);
    let reclaimer = Arc::new(CountingReclaimer::default());
    let pipeline = RequestPipeline::new(
        Arc::new(registry),
        Arc::new(LeadTextScraper::new(&FetchConfig::default()).unwrap()),
        reclaimer.clone(),
        ReclaimPolicy::Off,
    );

    pipeline.generate("coffee").await.unwrap();
    assert_eq!(reclaimer.calls.load(Ordering::SeqCst), 0);
}
