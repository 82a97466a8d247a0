use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use brief_core::config::{AppConfig, BackendKind};
use brief_core::logging::init_logging;
use brief_inference::{create_reclaimer, ModelRegistry};
use brief_scraper::{handle_command, LeadTextScraper, PipelineCommands, RequestPipeline};
use brief_web::{create_app, AppState};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to ./brief.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    /// Inference backend: ollama (default), dummy
    #[arg(long, global = true)]
    backend: Option<BackendKind>,
    /// Address to bind the web server to
    #[arg(long, global = true)]
    host: Option<String>,
    /// Port to bind the web server to
    #[arg(long, global = true, env = "PORT")]
    port: Option<u16>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the web interface (default)
    Serve,
    #[command(flatten)]
    Pipeline(PipelineCommands),
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

async fn build_pipeline(config: &AppConfig) -> anyhow::Result<RequestPipeline> {
    info!(backend = ?config.backend.kind, load = ?config.models.load, "🧠 Loading models");
    let registry = ModelRegistry::initialize(&config.models, &config.backend).await;

    let loaded = registry.loaded_models();
    if loaded.is_empty() {
        warn!("⚠️ No model loaded, every request will report the capability as unavailable");
    } else {
        let names: Vec<&str> = loaded.iter().map(|(_, model)| model.as_str()).collect();
        info!("✨ Models ready: {}", names.join(", "));
    }

    let reclaimer = create_reclaimer(&config.backend, loaded)?;
    let scraper = LeadTextScraper::new(&config.fetch)?;

    Ok(RequestPipeline::new(
        Arc::new(registry),
        Arc::new(scraper),
        reclaimer,
        config.reclaim.policy,
    ))
}

async fn serve(config: &AppConfig, pipeline: RequestPipeline) -> anyhow::Result<()> {
    let state = AppState::new(Arc::new(pipeline))?;
    let app = create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🌐 Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let pipeline = build_pipeline(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config, pipeline).await?,
        Commands::Pipeline(command) => handle_command(command, &pipeline).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["brief"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_pipeline_subcommands() {
        let cli = Cli::try_parse_from(["brief", "summarize", "https://example.com"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Pipeline(PipelineCommands::Summarize { ref url })) if url == "https://example.com"
        ));

        let cli = Cli::try_parse_from(["brief", "generate", "coffee", "--backend", "dummy"]).unwrap();
        assert_eq!(cli.backend, Some(BackendKind::Dummy));
        assert!(matches!(
            cli.command,
            Some(Commands::Pipeline(PipelineCommands::Generate { ref topic })) if topic == "coffee"
        ));

        assert!(Cli::try_parse_from(["brief", "--backend", "gpt"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["brief", "serve", "--host", "127.0.0.1", "--port", "8080"]).unwrap();
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backend.kind, BackendKind::Ollama);
    }
}
