//! Shutdown coordination for the load balancer.

use std::future::Future;

use tokio::sync::broadcast;

/// Broadcasts a single stop signal to the HTTP server and the health monitor.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Ignored if nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Resolves once `rx` sees the signal or the coordinator is dropped.
    pub fn wait(mut rx: broadcast::Receiver<()>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            let _ = rx.recv().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
