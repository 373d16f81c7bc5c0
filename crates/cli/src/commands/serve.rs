//! `serve` command implementation.

use anyhow::{Context, Result};
use contracts::{DispatcherConfig, EventDispatcher};
use ingress::AppState;
use tracing::{error, info, warn};

use super::load_config;
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let (mut config, _) = load_config(&args.config)?;

    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding listen address from CLI");
        config.http.host = host.clone();
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    info!(
        function = %config.invocation.function,
        users_table = %config.directory.users_table,
        servers_table = %config.directory.servers_table,
        listen = %config.http.host,
        dry_run = args.dry_run,
        "Starting dispatcher"
    );

    let sdk = dispatcher::load_aws_config(&config).await;

    if args.dry_run {
        let engine = dispatcher::create_dry_run_engine(&config, &sdk)
            .context("Failed to create dispatch engine")?;
        serve_with(engine, &config).await
    } else {
        let engine = dispatcher::create_engine(&config, &sdk)
            .context("Failed to create dispatch engine")?;
        serve_with(engine, &config).await
    }
}

async fn serve_with<D>(engine: D, config: &DispatcherConfig) -> Result<()>
where
    D: EventDispatcher + Send + Sync + 'static,
{
    let addr = config.http.listen_addr()?;
    let listener = ingress::bind(&addr).await?;

    ingress::serve(
        listener,
        AppState::new(engine),
        shutdown_signal(),
        config.http.drain_timeout(),
    )
    .await
    .context("HTTP ingress failed")?;

    info!("ws-dispatcher finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping ingress...");
}
