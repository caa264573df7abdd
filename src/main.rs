//! idea-scout - Startup Idea Research Pipeline
//!
//! # Usage
//!
//! ```bash
//! # Research one idea and print the verdict
//! idea-scout run --idea "AI meal planner for diabetics"
//!
//! # Same, printing the full final state as JSON
//! idea-scout run --idea "AI meal planner for diabetics" --context "B2B, clinics" --json
//!
//! # Start the WebSocket server
//! idea-scout serve --addr 0.0.0.0:8080
//! ```
//!
//! # Environment Variables
//!
//! - `IDEA_SCOUT_CONFIG`: Path to a TOML config file (default: `./scout_config.toml`)
//! - `IDEA_SCOUT_SOCIAL_API_KEY`, `IDEA_SCOUT_WEB_API_KEY`, `IDEA_SCOUT_LLM_API_KEY`
//! - `IDEA_SCOUT_SERVER_ADDR`: Bind address for `serve`
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use idea_scout::api::{create_app, ScoutState};
use idea_scout::{
    ApiKeys, PipelineEngine, RunContext, RunInput, RunState, ScoutConfig, Services, TracingSink,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "idea-scout")]
#[command(about = "Research a startup idea across social, web and LLM sources")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the pipeline once for a single idea
    Run {
        /// The idea to research
        #[arg(long)]
        idea: String,
        /// Optional extra context (audience, business model, ...)
        #[arg(long)]
        context: Option<String>,
        /// Print the final run state as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Serve the WebSocket transport
    Serve {
        /// Override the bind address from the config file
        #[arg(short, long, env = "IDEA_SCOUT_SERVER_ADDR")]
        addr: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_services(config: &ScoutConfig) -> Result<Services> {
    let keys = ApiKeys::from_env();
    let missing = keys.missing();
    if !missing.is_empty() {
        warn!(?missing, "API keys not set; calls to those services will fail and their stages degrade");
    }
    Services::from_config(config, &keys)
}

/// Cancel `token` on Ctrl+C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, cancelling...");
        token.cancel();
    });
}

// ============================================================================
// Commands
// ============================================================================

async fn run_once(
    config: Arc<ScoutConfig>,
    idea: String,
    context: Option<String>,
    json: bool,
) -> Result<()> {
    let services = build_services(&config)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let ctx = RunContext::new(services, config, Arc::new(TracingSink)).with_cancel(cancel);
    let input = match context {
        Some(context) => RunInput::new(idea).with_context(context),
        None => RunInput::new(idea),
    };

    let state = PipelineEngine::standard().run(input, &ctx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_summary(&state);
    }
    Ok(())
}

fn print_summary(state: &RunState) {
    let Some(verdict) = state.verdict.get() else {
        return;
    };
    println!();
    println!("  {}", state.idea);
    println!("  Score: {}/100  |  Recommendation: {}", verdict.score, verdict.recommendation);
    println!("  {}", verdict.headline);
    println!();
    println!("  {}", verdict.summary);
    for (title, items) in [
        ("Strengths", &verdict.strengths),
        ("Risks", &verdict.risks),
        ("Next steps", &verdict.next_steps),
    ] {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("  {title}:");
        for item in items {
            println!("    - {item}");
        }
    }
    println!();
}

async fn serve(config: Arc<ScoutConfig>, addr: Option<String>) -> Result<()> {
    let services = build_services(&config)?;
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let app = create_app(ScoutState::new(PipelineEngine::standard(), services, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("HTTP server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = Arc::new(ScoutConfig::load());

    match args.command {
        SubCommand::Run { idea, context, json } => run_once(config, idea, context, json).await,
        SubCommand::Serve { addr } => serve(config, addr).await,
        SubCommand::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
