//! Packet sender with fixed duplicate bursts.

use std::time::Duration;

use tracing::{debug, info};

use super::{resolve, Transport, UdpTransport};
use crate::error::{Result, TransportError};

/// Sends encoded packets to one destination.
pub struct Sender<T: Transport> {
    transport: T,
}

impl Sender<UdpTransport> {
    /// Open a UDP sender for `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let addr = resolve(host, port).await?;
        let transport = UdpTransport::connect(addr, None).await?;
        Ok(Self::new(transport))
    }
}

impl<T: Transport> Sender<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one datagram.
    pub async fn transmit(&self, data: &[u8]) -> Result<()> {
        let dst = self
            .transport
            .remote_addr()
            .map_or_else(|| "<unset>".to_string(), |a| a.to_string());
        debug!(%dst, len = data.len(), "sending udp packet");

        let sent = self.transport.send(data).await?;
        if sent != data.len() {
            return Err(TransportError::ShortWrite {
                sent,
                len: data.len(),
            }
            .into());
        }

        info!(%dst, len = data.len(), "sent udp packet");
        Ok(())
    }

    /// Send `data` once, then `duplicates` more times with `interval` between sends.
    ///
    /// The same bytes are sent every time; the packet is not re-encoded.
    pub async fn transmit_burst(&self, data: &[u8], duplicates: u8, interval: Duration) -> Result<()> {
        self.transmit(data).await?;

        for n in 1..=duplicates {
            tokio::time::sleep(interval).await;
            debug!(duplicate = n, of = duplicates, "sending duplicate");
            self.transmit(data).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    /// Records every send with the (virtual) time it happened.
    struct RecordingTransport {
        sent: Mutex<Vec<(Instant, Vec<u8>)>>,
        short_by: usize,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                short_by: 0,
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn local_addr(&self) -> Result<SocketAddr> {
            Ok("127.0.0.1:1".parse().unwrap())
        }

        fn remote_addr(&self) -> Option<SocketAddr> {
            Some("127.0.0.1:9999".parse().unwrap())
        }

        async fn send_to(&self, data: &[u8], _addr: SocketAddr) -> Result<usize> {
            self.send(data).await
        }

        async fn send(&self, data: &[u8]) -> Result<usize> {
            self.sent.lock().push((Instant::now(), data.to_vec()));
            Ok(data.len() - self.short_by)
        }

        async fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
            Err(TransportError::ReceiveFailed("send-only".into()).into())
        }

        fn transport_type(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_sends_identical_copies() {
        let sender = Sender::new(RecordingTransport::new());
        let data = b"packet bytes".to_vec();

        sender
            .transmit_burst(&data, 3, Duration::from_millis(100))
            .await
            .unwrap();

        let sent = sender.transport().sent.lock();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|(_, d)| *d == data));
        for pair in sent.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(100));
        }
    }

    #[tokio::test]
    async fn test_no_duplicates() {
        let sender = Sender::new(RecordingTransport::new());
        sender
            .transmit_burst(b"x", 0, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(sender.transport().sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_short_write_is_error() {
        let mut transport = RecordingTransport::new();
        transport.short_by = 1;
        let sender = Sender::new(transport);

        let err = sender.transmit(b"abcd").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::ShortWrite { sent: 3, len: 4 })
        ));
    }
}
