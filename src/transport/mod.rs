//! UDP transport for CCX packets.
//!
//! One datagram carries exactly one packet; there is no framing, ack or
//! retransmission. Duplicate bursts are a sender policy.

mod receiver;
mod sender;
mod udp;

pub use receiver::{DataUpdate, Receiver};
pub use sender::Sender;
pub use udp::UdpTransport;

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::{Result, TransportError};

/// Transport trait for sending and receiving datagrams.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the local address.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Get the remote address (if connected).
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// Send data to a specific address.
    async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize>;

    /// Send data to the remote address.
    async fn send(&self, data: &[u8]) -> Result<usize>;

    /// Receive one datagram with its source address.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;

    /// Get transport type name.
    fn transport_type(&self) -> &'static str;
}

/// Resolve `host:port` to the first matching socket address.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let target = format!("{host}:{port}");
    let addr = tokio::net::lookup_host(&target)
        .await
        .map_err(|_| TransportError::Resolve(target.clone()))?
        .next();
    addr.ok_or_else(|| TransportError::Resolve(target).into())
}
