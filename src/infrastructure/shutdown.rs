//! Graceful Shutdown Handler
//!
//! Signals the API server to stop accepting requests and finish in-flight ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shutdown coordinator for graceful termination.
#[derive(Clone)]
pub struct ShutdownController {
    /// Whether shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
    /// Broadcast channel for shutdown signal
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownController {
    /// Create a new shutdown controller.
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiate graceful shutdown.
    pub fn shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            tracing::info!("initiating graceful shutdown");
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Check if shutdown has been initiated.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM, then initiate shutdown.
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn shutdown_signal(controller: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }

    controller.shutdown();
}
