//! In-memory transport halves used by the loopback tests.

use async_trait::async_trait;
use tokio::io::{
    AsyncReadExt,
    AsyncWriteExt,
    DuplexStream,
    ReadHalf,
    WriteHalf,
};
use weft::{TransportReceiver, TransportSender};

pub struct DuplexSendHalf {
    writer: WriteHalf<DuplexStream>,
    connected: bool,
}

#[async_trait]
impl TransportSender for DuplexSendHalf {
    fn is_connected(&self) -> bool { self.connected }

    async fn send(&mut self, buffer: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buffer).await
    }

    async fn close(&mut self) {
        self.connected = false;
        let _ = self.writer.shutdown().await;
    }
}

pub struct DuplexReceiveHalf {
    reader: ReadHalf<DuplexStream>,
    connected: bool,
}

#[async_trait]
impl TransportReceiver for DuplexReceiveHalf {
    fn is_connected(&self) -> bool { self.connected }

    async fn receive(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buffer).await
    }

    async fn close(&mut self) { self.connected = false; }
}

pub type TransportHalves = (Box<dyn TransportSender>, Box<dyn TransportReceiver>);

/// Create two connected transport ends, one per peer.
#[must_use]
pub fn transport_pair() -> (TransportHalves, TransportHalves) {
    let (near, far) = tokio::io::duplex(64 * 1024);
    let (near_read, near_write) = tokio::io::split(near);
    let (far_read, far_write) = tokio::io::split(far);

    (
        (
            Box::new(DuplexSendHalf {
                writer: near_write,
                connected: true,
            }),
            Box::new(DuplexReceiveHalf {
                reader: near_read,
                connected: true,
            }),
        ),
        (
            Box::new(DuplexSendHalf {
                writer: far_write,
                connected: true,
            }),
            Box::new(DuplexReceiveHalf {
                reader: far_read,
                connected: true,
            }),
        ),
    )
}
