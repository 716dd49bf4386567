//! Server-side datagram receive loop (§4.5).

use std::sync::Arc;

use tracing::{debug, info, warn};
use types::MsgType;

use bank_core::Dispatcher;
use network::{LossSimulator, UdpEndpoint};

pub struct ServerTransport {
    endpoint: UdpEndpoint,
    loss: LossSimulator,
    dispatcher: Arc<Dispatcher>,
}

impl ServerTransport {
    pub fn new(endpoint: UdpEndpoint, loss: LossSimulator, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            endpoint,
            loss,
            dispatcher,
        }
    }

    /// Run the receive loop until `shutdown` resolves (a ctrl-c signal in the
    /// shipped binary, an explicit trigger in tests).
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> anyhow::Result<()> {
        info!(addr = ?self.endpoint.local_addr()?, "server transport listening");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping receive loop");
                    return Ok(());
                }
                recv = self.endpoint.recv_from() => {
                    let (datagram, peer) = match recv {
                        Ok(pair) => pair,
                        Err(err) => {
                            warn!(%err, "recv_from failed, continuing");
                            continue;
                        }
                    };
                    self.handle_datagram(&datagram, peer).await;
                }
            }
        }
    }

    async fn handle_datagram(&self, datagram: &[u8], peer: std::net::SocketAddr) {
        if self.loss.should_drop_request() {
            debug!(%peer, "simulated loss: dropping inbound request");
            return;
        }

        let message = match codec::decode(datagram) {
            Ok(message) => message,
            Err(err) => {
                warn!(%peer, %err, "dropping undecodable datagram");
                return;
            }
        };

        if message.header.msg_type != MsgType::Req {
            warn!(%peer, msg_type = ?message.header.msg_type, "dropping non-request datagram");
            return;
        }

        let result = self.dispatcher.handle_request(&message, peer);

        if self.loss.should_drop_reply() {
            debug!(%peer, "simulated loss: dropping reply");
        } else if let Err(err) = self.endpoint.send_to(&result.reply_bytes, peer).await {
            warn!(%peer, %err, "failed to send reply");
        }

        for (bytes, addr) in result.callbacks {
            if let Err(err) = self.endpoint.send_to(&bytes, addr).await {
                warn!(%addr, %err, "failed to send callback");
            }
        }
    }
}
