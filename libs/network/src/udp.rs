//! Thin wrapper over a bound UDP socket.
//!
//! The banking wire protocol is self-framing (the 32-byte header carries
//! `payloadLen`), so unlike the teacher's stream transports this does not
//! need a length-prefix framer: one `recv_from` already yields exactly one
//! datagram.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use types::MAX_PAYLOAD_SIZE;

use crate::error::{Result, TransportError};

/// Largest datagram we'll ever send or accept: header plus max TLV payload
/// plus a 4-byte CRC32 trailer.
pub const MAX_DATAGRAM_SIZE: usize = types::HEADER_LEN as usize + MAX_PAYLOAD_SIZE + 4;

pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|source| TransportError::Io {
            operation: "bind",
            source,
        })?;
        Ok(Self { socket })
    }

    /// Bind an ephemeral client socket on the given local address family's
    /// wildcard address and port 0.
    pub async fn bind_ephemeral(local_addr: std::net::IpAddr) -> Result<Self> {
        Self::bind(SocketAddr::new(local_addr, 0)).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|source| TransportError::Io {
            operation: "local_addr",
            source,
        })
    }

    pub async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::DatagramTooLarge {
                size: data.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        self.socket
            .send_to(data, target)
            .await
            .map_err(|source| TransportError::Io {
                operation: "send_to",
                source,
            })?;
        Ok(())
    }

    /// Receive one datagram into a fresh buffer sized to the protocol max,
    /// returning the payload and the sender's address.
    pub async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, peer) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(|source| TransportError::Io {
                operation: "recv_from",
                source,
            })?;
        buf.truncate(len);
        Ok((buf, peer))
    }
}
