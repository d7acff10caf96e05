//! Service supervisor binary.
//!
//! Runs the HTTP listeners described in a TOML file until SIGINT/SIGTERM or
//! the first listener failure.
//!
//! ```text
//! [shutdown]
//! timeout_secs = 10
//!
//! [[services]]
//! id = "public"
//! bind_address = "0.0.0.0:8080"
//! body = "hello"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use service_supervisor::config::{load_config, SupervisorConfig};
use service_supervisor::observability::init_tracing;
use service_supervisor::{HttpService, Service};

#[derive(Parser)]
#[command(name = "service-supervisor")]
#[command(about = "Run HTTP listeners under a shared lifecycle", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "supervisor.toml")]
    config: PathBuf,

    /// Override the shutdown grace period (0 = unbounded).
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,

    /// Emit JSON logs regardless of the config file.
    #[arg(long)]
    log_json: bool,
}

fn build_services(
    config: &SupervisorConfig,
) -> Result<Vec<Arc<dyn Service>>, Box<dyn std::error::Error>> {
    let mut services: Vec<Arc<dyn Service>> = Vec::with_capacity(config.services.len());
    for service in &config.services {
        let address: SocketAddr = service.bind_address.parse()?;
        services.push(Arc::new(HttpService::fixed_response(
            service.id.clone(),
            address,
            service.body.as_str(),
            Duration::from_secs(service.request_timeout_secs),
        )));
    }
    Ok(services)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(secs) = cli.shutdown_timeout_secs {
        config.shutdown.timeout_secs = secs;
    }

    init_tracing(cli.log_json || config.logging.json);

    tracing::info!(
        path = %cli.config.display(),
        services = config.services.len(),
        shutdown_timeout_secs = config.shutdown.timeout_secs,
        "Configuration loaded"
    );

    let services = build_services(&config)?;

    match service_supervisor::run(services, config.options()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(
                service = %e.service(),
                phase = %e.phase(),
                error = %e.cause(),
                "Supervisor stopped with error"
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
