#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use relay_proxy_lib::config::load_from_path;
use relay_proxy_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay reverse proxy and load balancer")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "config/relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration {}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(config.logging.level.clone(), config.logging.show_target) {
        eprintln!("failed to initialize tracing: {err}");
        return ExitCode::FAILURE;
    }

    info!(
        config = %cli.config.display(),
        listeners = config.listener.len(),
        global_services = config.service.len(),
        "configuration loaded"
    );

    let metrics = match config.telemetry.metrics_port {
        Some(port) => match init_metrics() {
            Ok((metrics, registry)) => {
                let is_ready: Arc<dyn Fn() -> bool + Send + Sync> = Arc::new(|| true);
                tokio::spawn(async move {
                    if let Err(err) = start_observability_server(port, registry, is_ready).await {
                        error!(%err, "observability server exited");
                    }
                });
                Some(metrics)
            }
            Err(err) => {
                error!(%err, "failed to initialize metrics, continuing without them");
                None
            }
        },
        None => None,
    };

    if let Err(err) = relay_proxy_lib::run(config, metrics).await {
        error!(%err, "proxy exited with error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
