//! cmdbusd - command bus daemon.
//!
//! Serves the JSON-lines command socket and, optionally, Prometheus metrics.

use cmdbus::App;
use cmdbus::config::Config;
use cmdbus::network::Gateway;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(cmdbus::config::ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %config_path, "Config file not found, using defaults");
            Config::default()
        }
        Err(e) => {
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s)", errors.len());
    }

    info!(server = %config.server.name, listen = %config.server.listen, "Starting cmdbusd");

    cmdbus::metrics::init();
    if let Some(port) = config.server.metrics_port {
        tokio::spawn(cmdbus::http::run_http_server(port));
    }

    let app = App::build(&config, |_| {}).await?;
    let gateway = Gateway::bind(config.server.listen, app.bus.clone()).await?;

    tokio::select! {
        result = gateway.run() => {
            if let Err(e) = result {
                error!(error = %e, "Gateway stopped");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("cmdbusd stopped");
    Ok(())
}
