//! UDP transport implementation.

use std::net::SocketAddr;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::net::UdpSocket;

use super::Transport;
use crate::error::{Result, TransportError};

/// UDP transport backed by a tokio socket.
pub struct UdpTransport {
    socket: UdpSocket,
    remote_addr: RwLock<Option<SocketAddr>>,
}

impl UdpTransport {
    /// Bind to a local address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed {
                addr,
                reason: e.to_string(),
            })?;

        Ok(Self {
            socket,
            remote_addr: RwLock::new(None),
        })
    }

    /// Create a UDP socket that sends to `remote_addr`.
    pub async fn connect(remote_addr: SocketAddr, bind_addr: Option<SocketAddr>) -> Result<Self> {
        // Bind to the wildcard of the remote address family
        let bind = bind_addr.unwrap_or_else(|| {
            if remote_addr.is_ipv6() {
                SocketAddr::from(([0u8; 16], 0))
            } else {
                SocketAddr::from(([0u8; 4], 0))
            }
        });

        let transport = Self::bind(bind).await?;
        transport
            .socket
            .connect(remote_addr)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                addr: remote_addr,
                reason: e.to_string(),
            })?;
        transport.set_remote(remote_addr);

        Ok(transport)
    }

    /// Set the remote address for send operations.
    pub fn set_remote(&self, addr: SocketAddr) {
        *self.remote_addr.write() = Some(addr);
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::SocketError(e.to_string()).into())
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        *self.remote_addr.read()
    }

    async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize> {
        self.socket
            .send_to(data, addr)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()).into())
    }

    async fn send(&self, data: &[u8]) -> Result<usize> {
        // Copy the address before await to avoid holding lock across await point
        let addr = { *self.remote_addr.read() };
        match addr {
            Some(addr) => self.send_to(data, addr).await,
            None => Err(TransportError::SendFailed("no remote address".into()).into()),
        }
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()).into())
    }

    fn transport_type(&self) -> &'static str {
        "udp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_remote_fails() {
        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert!(transport.remote_addr().is_none());
        assert!(transport.send(b"data").await.is_err());
    }

    #[tokio::test]
    async fn test_connected_round_trip() {
        let server = UdpTransport::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = UdpTransport::connect(server_addr, None).await.unwrap();
        assert_eq!(client.remote_addr(), Some(server_addr));
        assert_eq!(client.transport_type(), "udp");

        client.send(b"ccx").await.unwrap();

        let mut buf = [0u8; 64];
        let (len, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ccx");
        assert_eq!(from.port(), client.local_addr().unwrap().port());
    }
}
