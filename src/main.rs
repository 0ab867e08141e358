//! Reward Probe - feedback loop for a deployed Seldon model
//!
//! Loads the labelled dataset, then predicts, scores and reports every record
//! pass after pass until interrupted (Ctrl-C) or until a call fails.

use anyhow::Context;
use clap::Parser;
use reward_probe_core::{Dataset, FeedbackDriver, GatewayMode, ProbeConfig, SeldonClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reward-probe")]
#[command(about = "Replay a labelled dataset through a Seldon deployment and report rewards")]
#[command(version)]
struct Cli {
    /// TOML configuration file (flags below override its values)
    #[arg(short, long, env = "REWARD_PROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset file: header row, label in the last column
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Column delimiter of the dataset
    #[arg(long)]
    delimiter: Option<char>,

    /// Gateway mode (istio, ambassador, direct)
    #[arg(long)]
    gateway: Option<GatewayMode>,

    /// Namespace of the deployment
    #[arg(long)]
    namespace: Option<String>,

    /// Gateway address as host:port
    #[arg(long)]
    gateway_endpoint: Option<String>,

    /// Deployment name
    #[arg(long)]
    deployment: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Load the config file (or defaults) and apply flag overrides
    fn resolve_config(&self) -> anyhow::Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ProbeConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(gateway) = self.gateway {
            config.endpoint.gateway = gateway;
        }
        if let Some(namespace) = &self.namespace {
            config.endpoint.namespace = namespace.clone();
        }
        if let Some(endpoint) = &self.gateway_endpoint {
            config.endpoint.gateway_endpoint = endpoint.clone();
        }
        if let Some(deployment) = &self.deployment {
            config.endpoint.deployment_name = deployment.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.endpoint.timeout = Duration::from_secs(secs);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = cli.log_level.parse::<Level>().unwrap_or(Level::INFO);

    // Use specified level for the probe, but WARN for the HTTP stack
    let filter = EnvFilter::new(format!(
        "reward_probe={level},reward_probe_core={level},hyper=warn,reqwest=warn",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Reward probe v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.resolve_config()?;

    info!(
        "Target: deployment '{}' in namespace '{}' via {} at {}",
        config.endpoint.deployment_name,
        config.endpoint.namespace,
        config.endpoint.gateway,
        config.endpoint.gateway_endpoint
    );

    let dataset = Dataset::from_path(&config.dataset, config.delimiter_byte()?)
        .with_context(|| format!("Failed to load dataset {}", config.dataset.display()))?;
    let client = SeldonClient::new(&config.endpoint).context("Failed to create Seldon client")?;

    let driver = FeedbackDriver::new(Arc::new(client), Arc::new(dataset));

    // First Ctrl-C lets the pass in flight finish, a second one exits now
    let shutdown = driver.run_until_signalled(|| async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    });

    match shutdown.await {
        Ok(passes) => {
            info!("Reward probe stopped after {} pass(es)", passes);
            Ok(())
        }
        Err(e) => {
            error!("Reward probe halted: {}", e);
            Err(e.into())
        }
    }
}
