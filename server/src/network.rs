//! TCP accept loop: one task per connected session.

use crate::pool::Ipv4Network;
use crate::registry::HostRegistry;
use crate::session::Session;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// Accepts connections and hands each one to a fresh [`Session`] task.
///
/// The accept loop is the only serialization point for admitting sessions;
/// after spawn, a session blocks only on its own socket. The registry is the
/// single piece of shared mutable state and travels into each task as an
/// `Arc<RwLock<...>>` handle.
pub struct SessionServer {
    registry: Arc<RwLock<HostRegistry>>,
    next_session_id: u32,
}

impl SessionServer {
    /// Creates a server whose sessions allocate hosts from `network`.
    pub fn new(network: Ipv4Network) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HostRegistry::new(network))),
            next_session_id: 1,
        }
    }

    /// Shared handle to the host registry, for introspection in tests.
    pub fn registry(&self) -> Arc<RwLock<HostRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Binds a listener on `addr` and serves sessions until aborted.
    pub async fn run(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serves sessions from an already-bound listener.
    ///
    /// Accept errors are logged and the loop continues; a single failed
    /// connection never takes the server down.
    pub async fn serve(mut self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    // Session ids are monotonic and never reused.
                    let id = self.next_session_id;
                    self.next_session_id += 1;

                    info!("Session {} accepted from {}", id, peer);
                    let session = Session::new(id, Arc::clone(&self.registry));
                    tokio::spawn(session.run(stream));
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
