use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use ranctl_core::config::RanctlConfig;
use ranctl_runner::cli::RunnerCli;
use ranctl_runner::logging::init_tracing;
use ranctl_runner::orchestrator::{LifecycleOrchestrator, http_handles};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = RunnerCli::parse();

    // Precedence: CLI > env > file
    let mut config = RanctlConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!(
            "configuration is valid: {} component(s)",
            config.components.len()
        );
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(&config.general)?;
    tracing::info!(config = %cli.config.display(), "ranctl starting");

    let handles = http_handles(&config)?;
    let base_dir = cli.config.parent().filter(|p| !p.as_os_str().is_empty());
    let orchestrator = LifecycleOrchestrator::from_config(&config, base_dir);

    let token = orchestrator.cancellation_token();
    let signal_task = tokio::spawn(cancel_on_signal(token));

    let report = orchestrator.run(handles).await;
    signal_task.abort();

    println!("{}", report.to_json()?);

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Cancel the scenario on SIGTERM or SIGINT. Cleanup still runs.
async fn cancel_on_signal(token: CancellationToken) {
    match wait_for_shutdown_signal().await {
        Ok(signal) => {
            tracing::warn!(signal, "shutdown signal received, cancelling scenario");
            token.cancel();
        }
        Err(e) => tracing::error!(error = %e, "signal handling unavailable"),
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
