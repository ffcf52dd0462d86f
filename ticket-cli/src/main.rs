//! The `ticket-triage` binary.

use anyhow::Context;
use clap::Parser;
use rig::client::{CompletionClient, ProviderClient};
use rig::providers::openai;
use structured_extractor::extraction::ExtractionMetrics;
use structured_rig::RigModel;
use ticket_triage::app;
use ticket_triage::cli::{Cli, Commands};
use ticket_triage::ticket::ticket_schema;
use ticket_triage::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; variables may come from the shell.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Commands::Schema) {
        let schema = ticket_schema()?.to_json_schema();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let max_retries = match &cli.command {
        Commands::Reply { max_retries, .. } | Commands::Ticket { max_retries, .. } => *max_retries,
        Commands::Chat { .. } | Commands::Schema => None,
    };
    let config = AppConfig::from_env()?.with_overrides(cli.model, cli.timeout_secs, max_retries);
    tracing::info!(model = %config.model, "using OpenAI");

    // from_env reads OPENAI_API_KEY, which AppConfig::from_env has checked.
    let client = openai::Client::from_env();
    // Chat Completions honors `response_format` for JSON mode
    let model = RigModel::new(client.completion_model(config.model.as_str()).completions_api());

    match cli.command {
        Commands::Chat { message } => {
            let text = app::chat(&model, &message, &config).await.context("chat request failed")?;
            println!("{text}");
        }
        Commands::Reply { message, mode, .. } => {
            let (reply, metrics) = app::reply(model, &message, mode.into(), &config)
                .await
                .context("could not produce a valid reply")?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            report(&metrics);
        }
        Commands::Ticket { message, .. } => {
            let (ticket, metrics) = app::triage(model, &message, &config)
                .await
                .context("could not triage the ticket")?;
            println!("{}", serde_json::to_string_pretty(&ticket)?);
            report(&metrics);
        }
        Commands::Schema => {}
    }

    Ok(())
}

fn report(metrics: &ExtractionMetrics) {
    tracing::info!(
        attempts = metrics.total_attempts,
        wall_time_ms = metrics.wall_time.as_millis(),
        input_tokens = metrics.estimated_input_tokens,
        output_tokens = metrics.estimated_output_tokens,
        "extraction metrics"
    );
}
