mod cache;
mod cli;
mod error;
mod feed_xml;
mod freshen;
mod http;
mod paths;
mod queue;
mod remote;
mod resources;
mod state;
mod watcher;

use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use state::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.resolved_config_path();

    let config = match podbridge_common::config::load(&config_path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("podbridge: invalid configuration at {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    let _logging_guard = podbridge_common::init_logging(&config);
    tracing::info!(config_path = %config_path.display(), "starting podbridge");

    let state: Arc<AppState> = AppState::new(config);

    if cli.should_watch() {
        let watcher_state = Arc::clone(&state);
        tokio::spawn(async move { watcher::run(watcher_state).await });
    }

    tokio::select! {
        result = http::serve(Arc::clone(&state)) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "http server exited with error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("received shutdown signal, exiting");
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}
