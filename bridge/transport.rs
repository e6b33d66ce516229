use crate::envelope::RequestEnvelope;
use crate::error::App;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Carries request envelopes to the backend.
///
/// Responses travel the other way on a channel handed to
/// [`SignalBridge::attach`](crate::bridge::SignalBridge::attach).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn transmit(&self, envelope: RequestEnvelope) -> Result<(), App>;
}

/// In-process transport for a backend running in the same runtime.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<RequestEnvelope>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<RequestEnvelope>) -> Self {
        Self { tx }
    }

    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<RequestEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn transmit(&self, envelope: RequestEnvelope) -> Result<(), App> {
        self.tx.send(envelope).await?;
        Ok(())
    }
}
