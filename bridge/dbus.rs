//! The bridge on the session bus.
//!
//! Requests are delivered as calls to `Submit`. Every client numbers its
//! requests on its own, so the daemon hands the backend ids of its own and
//! remembers which caller each one belongs to. An answer goes back as a
//! `Response` signal addressed to that caller alone, carrying the caller's
//! id. Unsolicited signals are broadcast to everyone.

use crate::envelope::{RequestEnvelope, RequestId, ResponseEnvelope, UNSOLICITED};
use crate::error::App;
use crate::transport::Transport;
use async_trait::async_trait;
use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use zbus::message::Header;
use zbus::{fdo, interface, proxy, Connection, ConnectionBuilder, SignalContext};

pub const SERVICE_NAME: &str = "org.runebridge.Bridge";
pub const OBJECT_PATH: &str = "/org/runebridge/Bridge";
const RESPONSE_SIGNAL: &str = "Response";

/// Where the answer to a backend request has to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Unique bus name of the caller.
    pub destination: String,
    /// The id the caller gave its request.
    pub id: RequestId,
}

/// Maps backend request ids to the callers waiting for them.
#[derive(Clone, Default)]
pub struct Router {
    inner: Arc<RouterInner>,
}

#[derive(Default)]
struct RouterInner {
    last_id: AtomicU64,
    routes: Mutex<HashMap<RequestId, Route>>,
}

impl Router {
    fn routes(&self) -> MutexGuard<'_, HashMap<RequestId, Route>> {
        self.inner
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a request from `destination` and returns the id the backend
    /// sees for it. Never [`UNSOLICITED`].
    pub fn register(&self, destination: &str, id: RequestId) -> RequestId {
        let backend_id = self.inner.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.routes().insert(
            backend_id,
            Route {
                destination: destination.to_string(),
                id,
            },
        );
        backend_id
    }

    /// Takes the route of an answered request.
    pub fn resolve(&self, backend_id: RequestId) -> Option<Route> {
        self.routes().remove(&backend_id)
    }

    pub fn len(&self) -> usize {
        self.routes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct BridgeDBus {
    tx: mpsc::Sender<RequestEnvelope>,
    router: Router,
    stop_signal: watch::Sender<()>,
}

#[interface(name = "org.runebridge.Bridge")]
impl BridgeDBus {
    async fn test_connection(&self) -> fdo::Result<()> {
        Ok(())
    }

    async fn submit(
        &self,
        #[zbus(header)] header: Header<'_>,
        id: u64,
        name: String,
        payload: String,
    ) -> fdo::Result<()> {
        let sender = header
            .sender()
            .ok_or_else(|| fdo::Error::Failed("Submit without a sender".to_string()))?;
        let backend_id = self.router.register(sender.as_str(), id);
        debug!("Submit {} #{} from {} as #{}", name, id, sender, backend_id);

        let envelope = RequestEnvelope {
            id: backend_id,
            name,
            payload,
        };
        if let Err(e) = self.tx.send(envelope).await {
            self.router.resolve(backend_id);
            return Err(fdo::Error::Failed(format!("Backend is gone: {e}")));
        }
        Ok(())
    }

    async fn stop(&self) -> fdo::Result<()> {
        self.stop_signal
            .send(())
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    #[zbus(signal)]
    async fn response(
        ctxt: &SignalContext<'_>,
        id: u64,
        name: &str,
        payload: &str,
    ) -> zbus::Result<()>;
}

/// Serves the bridge until `stop_signal` fires, forwarding requests to
/// `command_sender` and sending everything from `responses` back out as
/// signals.
pub async fn run_dbus_server(
    command_sender: mpsc::Sender<RequestEnvelope>,
    mut responses: mpsc::Receiver<ResponseEnvelope>,
    stop_signal: watch::Sender<()>,
) -> Result<(), App> {
    let router = Router::default();
    let bridge_dbus = BridgeDBus {
        tx: command_sender,
        router: router.clone(),
        stop_signal: stop_signal.clone(),
    };

    let connection = ConnectionBuilder::session()?
        .name(SERVICE_NAME)?
        .serve_at(OBJECT_PATH, bridge_dbus)?
        .build()
        .await?;
    let iface = connection
        .object_server()
        .interface::<_, BridgeDBus>(OBJECT_PATH)
        .await?;
    info!("Serving {} at {}", SERVICE_NAME, OBJECT_PATH);

    let mut stop_receiver = stop_signal.subscribe();
    loop {
        tokio::select! {
            _ = stop_receiver.changed() => {
                info!("Stop signal received, shutting down DBus server...");
                break;
            }
            response = responses.recv() => {
                let Some(response) = response else {
                    info!("Backend closed, shutting down DBus server...");
                    break;
                };
                let sent = if response.is_unsolicited() {
                    BridgeDBus::response(
                        iface.signal_context(),
                        UNSOLICITED,
                        &response.name,
                        &response.payload,
                    )
                    .await
                } else if let Some(route) = router.resolve(response.id) {
                    connection
                        .emit_signal(
                            Some(route.destination.as_str()),
                            OBJECT_PATH,
                            SERVICE_NAME,
                            RESPONSE_SIGNAL,
                            &(route.id, response.name.as_str(), response.payload.as_str()),
                        )
                        .await
                } else {
                    warn!("Nobody is waiting for {} #{}", response.name, response.id);
                    Ok(())
                };
                if let Err(e) = sent {
                    error!("Failed to emit {} #{}: {}", response.name, response.id, e);
                }
            }
        }
    }

    Ok(())
}

#[proxy(
    interface = "org.runebridge.Bridge",
    default_service = "org.runebridge.Bridge",
    default_path = "/org/runebridge/Bridge"
)]
pub trait RemoteBridge {
    async fn test_connection(&self) -> zbus::Result<()>;
    async fn submit(&self, id: u64, name: &str, payload: &str) -> zbus::Result<()>;
    async fn stop(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn response(&self, id: u64, name: String, payload: String) -> zbus::Result<()>;
}

pub struct DbusTransport {
    proxy: RemoteBridgeProxy<'static>,
}

impl DbusTransport {
    /// Connects to a running daemon. The returned receiver yields every
    /// `Response` signal; it is subscribed before this returns so no answer
    /// to a later request can be missed.
    pub async fn connect(
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<ResponseEnvelope>), App> {
        let connection = Connection::session().await?;
        let proxy = RemoteBridgeProxy::new(&connection).await?;
        let mut signals = proxy.receive_response().await?;
        let (tx, rx) = mpsc::channel(capacity);

        tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                let envelope = match signal.args() {
                    Ok(args) => ResponseEnvelope {
                        id: *args.id(),
                        name: args.name().clone(),
                        payload: args.payload().clone(),
                    },
                    Err(e) => {
                        error!("Malformed Response signal: {}", e);
                        continue;
                    }
                };
                if tx.send(envelope).await.is_err() {
                    break;
                }
            }
            debug!("Response signal stream ended");
        });

        Ok((Self { proxy }, rx))
    }

    pub async fn test_connection(&self) -> Result<(), App> {
        self.proxy.test_connection().await?;
        Ok(())
    }

    pub async fn stop_daemon(&self) -> Result<(), App> {
        self.proxy.stop().await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for DbusTransport {
    async fn transmit(&self, envelope: RequestEnvelope) -> Result<(), App> {
        self.proxy
            .submit(envelope.id, &envelope.name, &envelope.payload)
            .await?;
        Ok(())
    }
}
