use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most paragraphs the lead-text extractor keeps from a page.
pub const MAX_PARAGRAPHS: usize = 3;

/// Text handed to summarization when a page yields nothing and the
/// placeholder policy is active.
pub const PLACEHOLDER_TEXT: &str = "No readable paragraph text was found on this page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Summarize,
    Generate,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 2] = [CapabilityKind::Summarize, CapabilityKind::Generate];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Summarize => "summarize",
            CapabilityKind::Generate => "generate",
        }
    }

    /// Human-readable model description used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            CapabilityKind::Summarize => "summarization",
            CapabilityKind::Generate => "text generation",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where a model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    #[default]
    Cpu,
    Gpu(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Gpu(index) => write!(f, "gpu:{}", index),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    /// Accepts `cpu`, `-1`, `gpu`, `gpu:N`, `cuda:N` or a bare GPU index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "cpu" | "-1" => return Ok(Device::Cpu),
            "gpu" | "cuda" => return Ok(Device::Gpu(0)),
            _ => {}
        }

        let index = s
            .strip_prefix("gpu:")
            .or_else(|| s.strip_prefix("cuda:"))
            .unwrap_or(&s);

        index
            .parse::<u32>()
            .map(Device::Gpu)
            .map_err(|_| format!("Invalid device: {}", s))
    }
}

impl TryFrom<String> for Device {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// Numeric precision or quantization variant of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Auto,
    F32,
    F16,
    #[serde(rename = "q8_0")]
    Q8,
    #[serde(rename = "q4_k_m")]
    Q4KM,
    #[serde(rename = "q4_0")]
    Q4,
}

impl Precision {
    /// Tag suffix the backend uses for this variant, `None` for `Auto`.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Precision::Auto => None,
            Precision::F32 => Some("fp32"),
            Precision::F16 => Some("fp16"),
            Precision::Q8 => Some("q8_0"),
            Precision::Q4KM => Some("q4_K_M"),
            Precision::Q4 => Some("q4_0"),
        }
    }
}

/// Model identifier plus placement knobs for one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model: String,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub precision: Precision,
}

impl ModelSpec {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            device: Device::Cpu,
            precision: Precision::Auto,
        }
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Backend model name, e.g. `llama3.2:1b` with `q4_0` becomes `llama3.2:1b-q4_0`.
    pub fn reference(&self) -> String {
        match self.precision.tag() {
            None => self.model.clone(),
            Some(tag) if self.model.contains(':') => format!("{}-{}", self.model, tag),
            Some(tag) => format!("{}:{}", self.model, tag),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub paragraphs: Vec<String>,
    pub combined_text: String,
    pub fetched_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// Keeps at most [`MAX_PARAGRAPHS`] non-empty paragraphs, in order.
    /// `combined_text` is empty when nothing survives.
    pub fn from_paragraphs<I, S>(url: impl Into<String>, paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .take(MAX_PARAGRAPHS)
            .collect();
        let combined_text = paragraphs.join(" ");

        Self {
            url: url.into(),
            paragraphs,
            combined_text,
            fetched_at: Utc::now(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.paragraphs.is_empty()
    }

    pub fn with_placeholder(mut self) -> Self {
        if self.combined_text.is_empty() {
            self.combined_text = PLACEHOLDER_TEXT.to_string();
        }
        self
    }
}

/// Decoding bounds passed with every inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    pub max_length: u32,
    pub min_length: Option<u32>,
    pub do_sample: bool,
    pub temperature: Option<f32>,
    pub num_return_sequences: u32,
}

impl InferenceParams {
    pub const SUMMARIZE: InferenceParams = InferenceParams {
        max_length: 130,
        min_length: Some(30),
        do_sample: false,
        temperature: None,
        num_return_sequences: 1,
    };

    pub const GENERATE: InferenceParams = InferenceParams {
        max_length: 200,
        min_length: None,
        do_sample: true,
        temperature: Some(0.7),
        num_return_sequences: 1,
    };

    pub fn for_capability(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Summarize => Self::SUMMARIZE,
            CapabilityKind::Generate => Self::GENERATE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub capability: CapabilityKind,
    pub input: String,
    pub params: InferenceParams,
}

impl InferenceRequest {
    pub fn summarize(text: impl Into<String>) -> Self {
        Self {
            capability: CapabilityKind::Summarize,
            input: text.into(),
            params: InferenceParams::SUMMARIZE,
        }
    }

    pub fn generate(prompt: impl Into<String>) -> Self {
        Self {
            capability: CapabilityKind::Generate,
            input: prompt.into(),
            params: InferenceParams::GENERATE,
        }
    }

    pub fn with_params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("-1".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("gpu".parse::<Device>().unwrap(), Device::Gpu(0));
        assert_eq!("gpu:2".parse::<Device>().unwrap(), Device::Gpu(2));
        assert_eq!("CUDA:1".parse::<Device>().unwrap(), Device::Gpu(1));
        assert_eq!("3".parse::<Device>().unwrap(), Device::Gpu(3));
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::Gpu(1).to_string(), "gpu:1");
    }

    #[test]
    fn test_model_reference_with_precision() {
        let spec = ModelSpec::new("llama3.2:1b");
        assert_eq!(spec.reference(), "llama3.2:1b");

        let spec = spec.with_precision(Precision::Q4);
        assert_eq!(spec.reference(), "llama3.2:1b-q4_0");

        let spec = ModelSpec::new("gemma2").with_precision(Precision::F16);
        assert_eq!(spec.reference(), "gemma2:fp16");
    }

    #[test]
    fn test_extraction_keeps_three_paragraphs() {
        let result = ExtractionResult::from_paragraphs(
            "https://example.com",
            ["  A. ", "", "B.", "   ", "C.", "D."],
        );
        assert_eq!(result.paragraphs, vec!["A.", "B.", "C."]);
        assert_eq!(result.combined_text, "A. B. C.");
        assert!(result.has_content());
    }

    #[test]
    fn test_placeholder_only_replaces_empty_text() {
        let empty = ExtractionResult::from_paragraphs("https://example.com", Vec::<String>::new());
        assert!(!empty.has_content());
        assert_eq!(empty.with_placeholder().combined_text, PLACEHOLDER_TEXT);

        let full = ExtractionResult::from_paragraphs("https://example.com", ["Text."]);
        assert_eq!(full.with_placeholder().combined_text, "Text.");
    }

    #[test]
    fn test_capability_display_is_padded() {
        assert_eq!(CapabilityKind::Generate.to_string(), "generate");
        assert_eq!(format!("{:<10}|", CapabilityKind::Summarize), "summarize |");
        assert_eq!(CapabilityKind::Summarize.label(), "summarization");
    }
}
