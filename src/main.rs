use anyhow::Result;
use clap::Parser;
use skribbl_relay::ai::GeminiPredictionClient;
use skribbl_relay::models::Config;
use skribbl_relay::predictor::Predictor;
use skribbl_relay::server::{self, AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "skribbl-relay")]
#[command(about = "Relay drawings to Gemini and return word guesses")]
struct CliArgs {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (overrides HOST).
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skribbl_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!(
        "Starting skribbl-relay (model: {}, attempts: {}, provider retries: {})",
        config.model, config.max_attempts, config.provider_max_retries
    );

    let model = GeminiPredictionClient::from_config(&config);
    let predictor = Predictor::new(Arc::new(model))
        .with_policy(config.retry_policy())
        .with_validation(config.word_validation);

    let state = AppState {
        predictor: Arc::new(predictor),
    };
    let addr = format!("{}:{}", config.host, config.port);

    server::serve(&addr, state, config.body_limit).await?;
    Ok(())
}
