pub mod cli;
pub mod pipeline;
pub mod scrapers;

pub use cli::{handle_command, PipelineCommands};
pub use pipeline::{build_prompt, Failure, PipelineResult, RequestPipeline};
pub use scrapers::{validate_url, LeadTextScraper, Scraper};

pub mod prelude {
    pub use super::pipeline::{Failure, RequestPipeline};
    pub use super::scrapers::Scraper;
    pub use brief_core::{Error, ExtractionResult, FailureKind, Result};
}
