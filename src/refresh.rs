//! Background data refresh system
//!
//! Re-resolves a query on a fixed interval in a background task and reports
//! results over a tokio channel.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::FetchOptions;
use crate::market::MarketData;
use crate::resolver::Resolver;
use crate::source::Query;

/// Messages sent from the background refresh task
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A refresh cycle started
    RefreshStarted,
    /// Fresh data was resolved
    Updated(MarketData),
    /// Every source failed or was empty
    RefreshError(String),
    /// A refresh cycle finished
    RefreshCompleted,
}

/// Configuration for the refresh interval
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refresh cycles
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Signals shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns a task resolving `query` every `config.interval`
    ///
    /// The first cycle runs immediately. With refresh disabled no task is
    /// spawned and the receiver never yields.
    pub fn spawn(
        resolver: Resolver,
        query: Query,
        options: FetchOptions,
        config: RefreshConfig,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if msg_tx.send(RefreshMessage::RefreshStarted).await.is_err() {
                                break;
                            }

                            let message = match resolver.resolve(&query, &options).await {
                                Ok(data) => RefreshMessage::Updated(data),
                                Err(e) => RefreshMessage::RefreshError(e.to_string()),
                            };
                            let _ = msg_tx.send(message).await;
                            let _ = msg_tx.send(RefreshMessage::RefreshCompleted).await;
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("refresh task shutting down");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
