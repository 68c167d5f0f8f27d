//! Datagram transport to a single LED controller.
//!
//! Each controller receives one bare UDP datagram per frame: its
//! pixels as consecutive `R, G, B` bytes, no header. The receiver
//! is expected to treat the payload as pixel triplets in order.
//!
//! ## Wire format
//!
//! ```text
//! r0 g0 b0 r1 g1 b1 ... r(n-1) g(n-1) b(n-1)     (n = segment led count)
//! ```

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};

use crate::error::{BlineError, Result};

// ── SegmentSink ──────────────────────────────────────────────────

/// Destination for one segment's frame bytes.
///
/// [`LedStrip`](crate::LedStrip) only talks to its controllers through
/// this trait, so any byte sink can stand in for a UDP socket.
#[async_trait]
pub trait SegmentSink: Send {
    /// Deliver `frame` as a single datagram.
    async fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Release the underlying connection.
    async fn close(&mut self) -> io::Result<()>;
}

// ── UdpSegment ───────────────────────────────────────────────────

/// A connected UDP socket targeting one controller.
#[derive(Debug)]
pub struct UdpSegment {
    socket: Option<UdpSocket>,
    remote_addr: SocketAddr,
}

impl UdpSegment {
    /// Resolve `address:port` and connect a UDP socket to it.
    ///
    /// The first resolved endpoint wins. The local socket is bound to
    /// the wildcard address of the same family on an ephemeral port.
    pub async fn open(address: &str, port: u16) -> Result<Self> {
        if address.is_empty() {
            return Err(BlineError::Address);
        }
        let endpoint = format!("{address}:{port}");

        let remote_addr = lookup_host((address, port))
            .await
            .map_err(|source| BlineError::Resolution {
                endpoint: endpoint.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| BlineError::Resolution {
                endpoint: endpoint.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            })?;

        let local: SocketAddr = if remote_addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let connect = async {
            let socket = UdpSocket::bind(local).await?;
            socket.connect(remote_addr).await?;
            Ok::<_, io::Error>(socket)
        };
        let socket = connect
            .await
            .map_err(|source| BlineError::Connection { endpoint, source })?;

        tracing::debug!("segment socket connected to {remote_addr}");
        Ok(Self::new(socket, remote_addr))
    }

    /// Wrap an already-connected socket.
    pub fn new(socket: UdpSocket, remote_addr: SocketAddr) -> Self {
        Self {
            socket: Some(socket),
            remote_addr,
        }
    }

    /// The controller this segment sends to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

#[async_trait]
impl SegmentSink for UdpSegment {
    async fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "segment closed"))?;

        let sent = socket.send(frame).await?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: {sent} of {} bytes", frame.len()),
            ));
        }
        tracing::trace!("sent {sent} bytes to {}", self.remote_addr);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        match self.socket.take() {
            Some(socket) => {
                drop(socket);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "segment already closed",
            )),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
