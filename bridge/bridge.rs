//! Request/response correlation over a [`Transport`].
//!
//! Every request gets a fresh [`RequestId`]. Callers awaiting an answer
//! register a waiter under that id before the request leaves, so the
//! backend's answer is routed to the caller that asked for it even when
//! several requests of the same type are in flight. Every response is also
//! published to subscribers of its signal type.

use crate::envelope::{RequestEnvelope, RequestId, ResponseEnvelope};
use crate::error::App;
use crate::signals::{Request, Signal};
use crate::transport::Transport;
use futures_util::stream::{self, Stream};
use log::{debug, warn};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

type Pending = HashMap<RequestId, oneshot::Sender<ResponseEnvelope>>;

#[derive(Clone)]
pub struct SignalBridge {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
    pending: Mutex<Pending>,
    published: broadcast::Sender<ResponseEnvelope>,
}

impl SignalBridge {
    pub fn new(transport: Arc<dyn Transport>, capacity: usize) -> Self {
        let (published, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                transport,
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                published,
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> RequestId {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of requests still waiting for their answer.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Sends a request without waiting for its answer.
    pub async fn send<R: Request>(&self, request: &R) -> Result<RequestId, App> {
        let id = self.next_id();
        let envelope = RequestEnvelope::encode(id, request)?;
        debug!("Sending {} #{}", R::NAME, id);
        self.inner.transport.transmit(envelope).await?;
        Ok(id)
    }

    /// Sends a request and waits for the response carrying its id.
    ///
    /// Waits forever if the backend never answers; see
    /// [`request_timeout`](Self::request_timeout).
    pub async fn request<R: Request>(&self, request: &R) -> Result<R::Response, App> {
        let id = self.next_id();
        let envelope = RequestEnvelope::encode(id, request)?;
        let (tx, rx) = oneshot::channel();
        self.pending().insert(id, tx);
        let _waiter = Waiter { bridge: self, id };

        debug!("Requesting {} #{}", R::NAME, id);
        self.inner.transport.transmit(envelope).await?;
        let response = rx.await?;
        response.into_response()
    }

    pub async fn request_timeout<R: Request>(
        &self,
        request: &R,
        timeout: Duration,
    ) -> Result<R::Response, App> {
        tokio::time::timeout(timeout, self.request(request))
            .await
            .map_err(|_| App::Timeout(timeout))?
    }

    /// Subscribes to every future signal of type `S`.
    pub fn subscribe<S: Signal>(&self) -> SignalStream<S> {
        SignalStream {
            receiver: self.inner.published.subscribe(),
            _signal: PhantomData,
        }
    }

    /// Routes one inbound response to its waiter and to subscribers.
    pub fn deliver(&self, envelope: ResponseEnvelope) {
        if !envelope.is_unsolicited() {
            let waiter = self.pending().remove(&envelope.id);
            match waiter {
                Some(tx) => {
                    if tx.send(envelope.clone()).is_err() {
                        debug!("Waiter for #{} went away", envelope.id);
                    }
                }
                None => debug!("No waiter for {} #{}", envelope.name, envelope.id),
            }
        }
        // No subscribers is fine.
        let _ = self.inner.published.send(envelope);
    }

    /// Spawns a task feeding `inbound` into [`deliver`](Self::deliver). The
    /// bridge is closed once the channel ends.
    pub fn attach(&self, mut inbound: mpsc::Receiver<ResponseEnvelope>) -> JoinHandle<()> {
        let bridge = self.clone();
        tokio::spawn(async move {
            while let Some(envelope) = inbound.recv().await {
                bridge.deliver(envelope);
            }
            debug!("Inbound signal channel closed");
            bridge.close();
        })
    }

    /// Fails every pending request with [`App::Closed`].
    pub fn close(&self) {
        let dropped = std::mem::take(&mut *self.pending());
        if !dropped.is_empty() {
            warn!("Closing bridge with {} pending requests", dropped.len());
        }
    }
}

struct Waiter<'a> {
    bridge: &'a SignalBridge,
    id: RequestId,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.bridge.pending().remove(&self.id);
    }
}

/// Decoded signals of one type, in arrival order.
pub struct SignalStream<S> {
    receiver: broadcast::Receiver<ResponseEnvelope>,
    _signal: PhantomData<fn() -> S>,
}

impl<S: Signal> SignalStream<S> {
    /// Next signal of type `S`, or `None` once the bridge is gone.
    pub async fn next(&mut self) -> Option<Result<S, App>> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.name == S::NAME => return Some(envelope.decode()),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("{} subscriber lagged, skipped {} signals", S::NAME, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the first signal of type `S`.
    pub async fn first(mut self) -> Result<S, App> {
        self.next().await.unwrap_or(Err(App::Closed))
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<S, App>> {
        stream::unfold(self, |mut signals| async move {
            signals.next().await.map(|item| (item, signals))
        })
    }
}
