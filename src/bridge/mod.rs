//! Request/response messaging between the panel and the host process.
//!
//! Each request travels in an envelope with a correlation id and a one-shot
//! reply slot; the sender waits a bounded time for its reply.

pub mod host;
pub mod protocol;

pub use host::BackgroundHost;
pub use protocol::{BridgeReply, BridgeRequest};

use crate::errors::{AgentError, Result};
use crate::types::TabId;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct BridgeEnvelope {
    pub id: Uuid,
    pub tab: TabId,
    pub request: BridgeRequest,
    pub reply: oneshot::Sender<BridgeReply>,
}

impl BridgeEnvelope {
    /// Answers the request. A sender that stopped waiting is not an error.
    pub fn respond(self, reply: BridgeReply) {
        if self.reply.send(reply).is_err() {
            debug!(id = %self.id, "reply dropped, requester gone");
        }
    }
}

/// Sending half, held by the panel side.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    tx: mpsc::Sender<BridgeEnvelope>,
    timeout: Duration,
}

/// Creates a connected client and the receiver a host serves.
pub fn channel(timeout: Duration) -> (BridgeClient, mpsc::Receiver<BridgeEnvelope>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (BridgeClient { tx, timeout }, rx)
}

impl BridgeClient {
    pub async fn request(&self, tab: &TabId, request: BridgeRequest) -> Result<BridgeReply> {
        let id = Uuid::new_v4();
        let kind = request.kind();
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = BridgeEnvelope {
            id,
            tab: tab.clone(),
            request,
            reply: reply_tx,
        };
        debug!(%id, tab = %tab, kind, "bridge request");

        self.tx
            .send(envelope)
            .await
            .map_err(|_| AgentError::Bridge("host is not listening".into()))?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(AgentError::Bridge(format!("{} dropped without a reply", kind))),
            Err(_) => Err(AgentError::Timeout(format!(
                "no reply to {} within {}ms",
                kind,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unanswered_requests_time_out() {
        let (client, mut rx) = channel(Duration::from_millis(500));
        let held = tokio::spawn(async move { rx.recv().await });
        let err = client
            .request(&TabId::from("1"), BridgeRequest::PingContent)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)), "{}", err);
        drop(held);
    }

    #[tokio::test]
    async fn dropped_envelopes_and_closed_hosts_are_errors() {
        let (client, mut rx) = channel(DEFAULT_REPLY_TIMEOUT);
        let host = tokio::spawn(async move {
            let envelope = rx.recv().await.unwrap();
            assert_eq!(envelope.request, BridgeRequest::GetState);
            drop(envelope);
        });
        let err = client
            .request(&TabId::from("1"), BridgeRequest::GetState)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GET_STATE dropped"));
        host.await.unwrap();

        let err = client
            .request(&TabId::from("1"), BridgeRequest::GetState)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Bridge(_)));
    }

    #[tokio::test]
    async fn replies_are_correlated() {
        let (client, mut rx) = channel(DEFAULT_REPLY_TIMEOUT);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let id = envelope.id.to_string();
                envelope.respond(BridgeReply::ok().with("id", id));
            }
        });
        let a = client.request(&TabId::from("1"), BridgeRequest::PingContent).await.unwrap();
        let b = client.request(&TabId::from("1"), BridgeRequest::PingContent).await.unwrap();
        assert!(a.ok && b.ok);
        assert_ne!(a.get("id"), b.get("id"));
    }
}
