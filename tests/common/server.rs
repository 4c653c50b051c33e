//! Test server management.
//!
//! Runs a gateway in-process on an ephemeral port.

use cmdbus::CommandBus;
use cmdbus::network::Gateway;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// A test server instance. The gateway task stops when this is dropped.
pub struct TestServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a gateway serving `bus`.
    pub async fn spawn(bus: CommandBus) -> anyhow::Result<Self> {
        let gateway = Gateway::bind(SocketAddr::from(([127, 0, 0, 1], 0)), bus).await?;
        let addr = gateway.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = gateway.run().await;
        });
        Ok(Self { addr, task })
    }

    /// Server address as `host:port`.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
