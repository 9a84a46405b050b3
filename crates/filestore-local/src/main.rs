mod config;
mod manifest;
mod storage;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use filestore_core::FileStoreError;
use filestore_session::FilesStore;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use storage::LocalFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let root = config.effective_root();

    info!("Starting filestore-local batch");
    info!("  Manifest: {}", config.manifest.display());
    info!("  Store root: {}", root.display());
    info!("  Store: {};{}", config.store_identifier, config.file_system);
    info!("  Max requests per session: {}", config.max_requests_per_session);

    tokio::fs::create_dir_all(&root)
        .await
        .with_context(|| format!("creating store root {}", root.display()))?;

    let store = FilesStore::builder(config.store_identifier.as_str(), config.file_system.as_str())
        .with_conventions(config.conventions())
        .with_commands(Arc::new(LocalFileStore::new(&root)))
        .build();
    let session = store.open_session();

    let entries = manifest::load(&config.manifest).await?;
    let total = entries.len();
    for (index, entry) in entries.into_iter().enumerate() {
        entry
            .register(&session)
            .await
            .with_context(|| format!("manifest entry {}", index))?;
    }
    info!("Queued {} operation(s) on session {}", total, session.id());

    let shutdown_rx = create_shutdown_signal();
    match session.save_changes_until(&shutdown_rx).await {
        Ok(()) => {
            info!("Applied {} operation(s)", total);
            Ok(())
        }
        Err(FileStoreError::Cancelled { remaining }) => {
            warn!(
                "Interrupted: {} of {} operation(s) applied",
                total.saturating_sub(remaining),
                total
            );
            anyhow::bail!("batch interrupted with {} operation(s) not applied", remaining)
        }
        Err(e) => {
            // The failed operation is no longer queued.
            let applied = total.saturating_sub(session.pending_operations() + 1);
            warn!("Batch failed: {} of {} operation(s) applied", applied, total);
            Err(e.into())
        }
    }
}

/// Create a shutdown signal that triggers on Ctrl+C or SIGTERM.
fn create_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, stopping after the current operation"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("Received SIGTERM, stopping after the current operation");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
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

        let _ = tx.send(true);
    });

    rx
}
