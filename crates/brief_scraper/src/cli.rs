use brief_core::CapabilityKind;
use brief_inference::CapabilityStatus;
use clap::Subcommand;

use crate::pipeline::{Failure, RequestPipeline};

#[derive(Subcommand, Debug, Clone)]
pub enum PipelineCommands {
    /// Summarize the lead text of a web page
    Summarize {
        /// Page to summarize, must start with http:// or https://
        url: String,
    },
    /// Generate a short social media post about a topic
    Generate {
        /// Topic of the post
        topic: String,
    },
    /// Show which capabilities loaded
    Models,
}

/// Run one pipeline command and print its outcome to stdout.
pub async fn handle_command(
    command: PipelineCommands,
    pipeline: &RequestPipeline,
) -> std::result::Result<(), Failure> {
    match command {
        PipelineCommands::Summarize { url } => {
            let summary = pipeline.summarize(&url).await?;
            println!("{}", summary);
        }
        PipelineCommands::Generate { topic } => {
            let post = pipeline.generate(&topic).await?;
            println!("{}", post);
        }
        PipelineCommands::Models => {
            println!("Capabilities:");
            for kind in CapabilityKind::ALL {
                let model = pipeline
                    .registry()
                    .capabilities()
                    .find(|c| c.kind() == kind)
                    .and_then(|c| c.spec().map(|spec| format!("{} on {}", spec.reference(), spec.device)))
                    .unwrap_or_else(|| "-".to_string());

                match pipeline.registry().status(kind) {
                    CapabilityStatus::Loaded => println!("  ✅ {:<10} {}", kind, model),
                    CapabilityStatus::Unavailable(reason) => {
                        println!("  ❌ {:<10} {} ({})", kind, model, reason)
                    }
                }
            }
        }
    }
    Ok(())
}
