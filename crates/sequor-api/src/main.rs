//! Sequor CLI and REST API entry point.
//!
//! Binary name: `sequor`
//!
//! Parses CLI arguments, loads configuration, wires the job registry to the
//! remote operation service, then dispatches to the appropriate command
//! handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "sequor", &mut std::io::stdout());
        return Ok(());
    }

    // Set up tracing. The server gets the full structured pipeline (with
    // optional OTel export); one-shot commands keep terse console logging.
    match &cli.command {
        Commands::Serve { otel, .. } => {
            let default_filter = match cli.verbose {
                0 => "info",
                1 => "info,sequor=debug",
                _ => "trace",
            };
            sequor_observe::tracing_setup::init_tracing(default_filter, *otel);
        }
        _ => {
            let filter = match cli.verbose {
                0 if cli.quiet => "error",
                0 => "warn",
                1 => "info,sequor=debug",
                _ => "trace",
            };
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(filter))
                .with_target(false)
                .init();
        }
    }

    // Initialize application state (config, remote client, registry)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Run {
            sequence,
            sequences_dir,
        } => {
            cli::job::run_sequence(
                &state,
                &sequence,
                sequences_dir.as_deref(),
                cli.json,
                cli.quiet,
            )
            .await?;
        }

        Commands::Validate { file } => {
            cli::sequence::validate_file(&file, cli.json)?;
        }

        Commands::Sequences { dir } => {
            let dir = dir.unwrap_or_else(|| state.sequences_dir.clone());
            cli::sequence::list_sequences(&dir, cli.json)?;
        }

        Commands::Serve { port, host, .. } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(addr = %addr, "REST API server listening");

            println!();
            println!(
                "  {} Sequor API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {} Remote operation service: {}",
                console::style("•").dim(),
                console::style(&state.config.remote.base_url).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            sequor_observe::tracing_setup::shutdown_tracing();
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
