//! Datagram receive loop.

use std::net::SocketAddr;
use std::time::SystemTime;

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{Transport, UdpTransport};
use crate::error::Result;

/// One received datagram.
#[derive(Debug, Clone)]
pub struct DataUpdate {
    /// Receive time.
    pub timestamp: SystemTime,
    /// Sender address.
    pub remote_addr: SocketAddr,
    /// Datagram contents, exactly as long as the datagram.
    pub data: Bytes,
}

/// Receives datagrams and hands each one to a handler.
pub struct Receiver<T: Transport> {
    transport: T,
    buffer_size: usize,
}

impl Receiver<UdpTransport> {
    /// Listen for UDP datagrams on `addr`.
    pub async fn bind(addr: SocketAddr, buffer_size: usize) -> Result<Self> {
        let transport = UdpTransport::bind(addr).await?;
        Ok(Self::new(transport, buffer_size))
    }
}

impl<T: Transport> Receiver<T> {
    pub fn new(transport: T, buffer_size: usize) -> Self {
        Self {
            transport,
            buffer_size,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Wait for the next datagram.
    pub async fn recv(&self) -> Result<DataUpdate> {
        let mut buf = vec![0u8; self.buffer_size];
        self.recv_into(&mut buf).await
    }

    async fn recv_into(&self, buf: &mut [u8]) -> Result<DataUpdate> {
        let (len, remote_addr) = self.transport.recv_from(buf).await?;
        debug!(%remote_addr, len, "received datagram");

        Ok(DataUpdate {
            timestamp: SystemTime::now(),
            remote_addr,
            data: Bytes::copy_from_slice(&buf[..len]),
        })
    }

    /// Deliver datagrams to `handler` until `shutdown` fires or a receive fails.
    pub async fn run<F>(&self, mut handler: F, mut shutdown: broadcast::Receiver<()>) -> Result<()>
    where
        F: FnMut(DataUpdate),
    {
        info!(
            addr = %self.local_addr()?,
            transport = self.transport.transport_type(),
            "receiver listening"
        );

        let mut buf = vec![0u8; self.buffer_size];
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("receiver shutting down");
                    return Ok(());
                }
                update = self.recv_into(&mut buf) => handler(update?),
            }
        }
    }
}
