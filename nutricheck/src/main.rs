use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nutricheck::api::{create_router, AppState};
use nutricheck::config::Config;
use nutricheck::services::{ClaimValidationService, ValidationOptions};

#[derive(Parser)]
#[command(name = "nutricheck")]
#[command(about = "Validate nutrition and health claims against PubMed evidence")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Check one claim and print the report as JSON
    Check {
        claim: String,
        /// Maximum number of PubMed records to retrieve
        #[arg(long)]
        max_results: Option<usize>,
        /// Publish the verdict to the configured ledger
        #[arg(long)]
        publish: bool,
        /// Include non-human studies
        #[arg(long)]
        include_non_human: bool,
        /// Accepted publication type (repeatable)
        #[arg(long = "publication-type")]
        publication_types: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutricheck=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();

    if let Some(extractor) = &config.extractor {
        tracing::info!("Initializing extraction model: {}...", extractor.model);
    }
    if let Some(enrichment) = &config.enrichment.llm {
        tracing::info!("Initializing enrichment model: {}...", enrichment.model);
    }
    let validation = ClaimValidationService::from_config(&config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, validation).await,
        Command::Check {
            claim,
            max_results,
            publish,
            include_non_human,
            publication_types,
        } => {
            let options = ValidationOptions {
                max_results,
                publish: publish.then_some(true),
                human_only: include_non_human.then_some(false),
                publication_types: (!publication_types.is_empty()).then_some(publication_types),
            };
            let report = validation.validate(&claim, &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(config: Config, validation: ClaimValidationService) -> anyhow::Result<()> {
    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "NUTRICHECK_API_KEYS is not set; the claim API and the web form are open to anyone"
        );
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, validation);
    let app = create_router(state);
    let cancel_token = CancellationToken::new();

    tracing::info!("Nutricheck starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI document: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel_token.cancelled() => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests...");
    cancel_token.cancel();
}
