//! Gateway - TCP listener that accepts command-socket clients.
//!
//! The Gateway binds a socket and spawns a Connection task for each
//! incoming client.

use crate::bus::CommandBus;
use crate::network::Connection;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// Accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    bus: CommandBus,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, bus: CommandBus) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Command socket bound");
        Ok(Self { listener, bus })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "Connection accepted");
                    let connection = Connection::new(stream, addr, self.bus.clone());
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(%addr, error = %e, "Connection error");
                        }
                        info!(%addr, "Connection closed");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
