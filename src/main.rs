// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The chronowatch binary.
//!
//! Diagnostics go to stderr via tracing so they never interleave with
//! the stdout log lines; any error terminates the process with a
//! non-zero status.

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use chronowatch::{Args, Error, Watcher};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chronowatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            tracing::error!(error = %e, "Failed to install signal handler");
        }
        let _ = shutdown_tx.send(());
    });

    let mut watcher = Watcher::connect(config).await?;
    watcher.run(shutdown_rx).await
}

/// Waits for SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}
