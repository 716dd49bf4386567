//! Client-side send-wait-retry engine (§4.6).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use types::{Message, MessageHeader, MsgType, OpCode, Semantics, TlvMap};

use config::RetryPolicy;
use network::UdpEndpoint;

/// Invoked for every CBK datagram received while idle or mid-wait.
pub type CallbackHandler = dyn Fn(Message) + Send + Sync;

pub struct ClientTransport {
    endpoint: UdpEndpoint,
    server_addr: SocketAddr,
    client_id: u32,
    seq_no: AtomicU32,
    retry_policy: RetryPolicy,
    callback_handler: Option<Arc<CallbackHandler>>,
}

impl ClientTransport {
    pub async fn connect(server_addr: SocketAddr, client_id: u32, retry_policy: RetryPolicy) -> network::Result<Self> {
        let bind_addr = match server_addr {
            SocketAddr::V4(_) => std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
        };
        let endpoint = UdpEndpoint::bind_ephemeral(bind_addr).await?;
        Ok(Self {
            endpoint,
            server_addr,
            client_id,
            seq_no: AtomicU32::new(0),
            retry_policy,
            callback_handler: None,
        })
    }

    pub fn set_callback_handler(&mut self, handler: Arc<CallbackHandler>) {
        self.callback_handler = Some(handler);
    }

    pub fn local_addr(&self) -> network::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Send `op_code`/`payload` under `semantics` and wait for the matching
    /// reply, retransmitting the identical datagram on timeout up to the
    /// configured retry bound. Returns `None` once retries are exhausted.
    pub async fn send_request(&self, op_code: OpCode, payload: TlvMap, semantics: Semantics) -> Option<Message> {
        let seq_no = self.seq_no.fetch_add(1, Ordering::Relaxed);
        let header = MessageHeader::new_request(self.client_id, seq_no, op_code as u16, semantics);
        let request_id = header.request_id;
        let request = Message::new(header, payload);
        // Encoded once; every retransmit reuses this exact buffer (§8 invariant 5).
        let buffer = codec::encode(&request);

        let mut attempt = 0u32;
        loop {
            if let Err(err) = self.endpoint.send_to(&buffer, self.server_addr).await {
                warn!(%err, attempt, "send_to failed");
            }

            let timeout = self.retry_policy.timeout_for_attempt(attempt);
            match self.wait_for_reply(request_id, timeout).await {
                Some(reply) => return Some(reply),
                None => {
                    if attempt >= self.retry_policy.max_retries {
                        debug!(request_id, attempt, "retries exhausted, giving up");
                        return None;
                    }
                    attempt += 1;
                    debug!(request_id, attempt, ?timeout, "timed out, retransmitting");
                }
            }
        }
    }

    /// Wait up to `timeout` for the REP matching `request_id`. Any CBK seen
    /// along the way is delivered to the callback handler without resetting
    /// the deadline; any other datagram (decode failure, mismatched
    /// requestId, stray REQ) is discarded and waiting continues.
    async fn wait_for_reply(&self, request_id: u64, timeout: Duration) -> Option<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let recv = tokio::time::timeout(remaining, self.endpoint.recv_from()).await;
            let (datagram, _from) = match recv {
                Err(_elapsed) => return None,
                Ok(Err(err)) => {
                    warn!(%err, "recv_from failed while waiting for reply");
                    continue;
                }
                Ok(Ok(pair)) => pair,
            };

            let message = match codec::decode(&datagram) {
                Ok(message) => message,
                Err(err) => {
                    debug!(%err, "discarding undecodable datagram");
                    continue;
                }
            };

            match message.header.msg_type {
                MsgType::Cbk => {
                    if let Some(handler) = &self.callback_handler {
                        handler(message);
                    }
                }
                MsgType::Rep if message.header.request_id == request_id => {
                    return Some(message);
                }
                _ => {
                    debug!("discarding datagram not matching the pending request");
                }
            }
        }
    }

    /// Listen for CBK datagrams only, for up to `duration`, delivering each
    /// to the callback handler and ignoring REPs. For dedicated monitor
    /// peers that never issue their own requests.
    pub async fn listen_for_callbacks(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            let recv = tokio::time::timeout(remaining, self.endpoint.recv_from()).await;
            let (datagram, _from) = match recv {
                Err(_elapsed) => return,
                Ok(Err(_err)) => continue,
                Ok(Ok(pair)) => pair,
            };
            let Ok(message) = codec::decode(&datagram) else {
                continue;
            };
            if message.header.msg_type == MsgType::Cbk {
                if let Some(handler) = &self.callback_handler {
                    handler(message);
                }
            }
        }
    }
}
