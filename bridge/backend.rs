//! The native side of the bridge: answers every request exactly once with
//! the request's id, and broadcasts playback status changes.

use crate::bridge::SignalBridge;
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::App;
use crate::library::Library;
use crate::player::Player;
use crate::signals::{
    BackendError, CollectionGroupSummaryResponse, CollectionGroupsResponse,
    FetchCollectionGroupSummaryRequest, FetchCollectionGroupsRequest, FetchPlaybackStatusRequest,
    NextRequest, PauseRequest, PlayRequest, PlaybackMode, PreviousRequest,
    SetPlaybackModeRequest, Signal, StopRequest,
};
use crate::transport::ChannelTransport;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;

pub struct Backend {
    library: Library,
    player: Player,
    outbound: mpsc::Sender<ResponseEnvelope>,
}

impl Backend {
    /// Creates a backend whose queue holds every library track.
    pub fn new(library: Library, mode: PlaybackMode, outbound: mpsc::Sender<ResponseEnvelope>) -> Self {
        let player = Player::new(library.tracks.clone(), mode);
        Self {
            library,
            player,
            outbound,
        }
    }

    /// Handles requests until the channel closes or nobody listens anymore.
    pub async fn run(mut self, mut requests: mpsc::Receiver<RequestEnvelope>) {
        info!("Backend started with {} tracks", self.library.tracks.len());
        while let Some(request) = requests.recv().await {
            if let Err(e) = self.handle(request).await {
                error!("Failed to answer request: {}", e);
                if matches!(e, App::Send(_)) {
                    break;
                }
            }
        }
        info!("Backend stopped");
    }

    pub async fn handle(&mut self, request: RequestEnvelope) -> Result<(), App> {
        let previous_state = self.player.state();
        let response = match self.answer(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!("Request {} #{} failed: {}", request.name, request.id, e);
                ResponseEnvelope::encode(
                    request.id,
                    &BackendError {
                        message: e.to_string(),
                    },
                )?
            }
        };
        self.outbound.send(response).await?;

        if self.player.state() != previous_state {
            let status = ResponseEnvelope::unsolicited(&self.player.status())?;
            self.outbound.send(status).await?;
        }
        Ok(())
    }

    fn answer(&mut self, request: &RequestEnvelope) -> Result<ResponseEnvelope, App> {
        let id = request.id;
        match request.name.as_str() {
            name if name == PlayRequest::NAME => {
                request.decode::<PlayRequest>()?;
                self.player.play();
            }
            name if name == PauseRequest::NAME => {
                request.decode::<PauseRequest>()?;
                self.player.pause();
            }
            name if name == StopRequest::NAME => {
                request.decode::<StopRequest>()?;
                self.player.stop();
            }
            name if name == NextRequest::NAME => {
                request.decode::<NextRequest>()?;
                self.player.next()?;
            }
            name if name == PreviousRequest::NAME => {
                request.decode::<PreviousRequest>()?;
                self.player.previous()?;
            }
            name if name == SetPlaybackModeRequest::NAME => {
                let SetPlaybackModeRequest { mode } = request.decode()?;
                info!("Playback mode set to {mode:?}");
                self.player.set_mode(mode);
            }
            name if name == FetchPlaybackStatusRequest::NAME => {
                request.decode::<FetchPlaybackStatusRequest>()?;
            }
            name if name == FetchCollectionGroupSummaryRequest::NAME => {
                let FetchCollectionGroupSummaryRequest { collection_type } = request.decode()?;
                let response = CollectionGroupSummaryResponse {
                    collection_type,
                    groups: self.library.group_summary(collection_type),
                };
                return ResponseEnvelope::encode(id, &response);
            }
            name if name == FetchCollectionGroupsRequest::NAME => {
                let FetchCollectionGroupsRequest {
                    collection_type,
                    group_titles,
                } = request.decode()?;
                let response = CollectionGroupsResponse {
                    collection_type,
                    groups: self.library.groups(collection_type, &group_titles),
                };
                return ResponseEnvelope::encode(id, &response);
            }
            other => return Err(App::InvalidInput(format!("unknown request {other}"))),
        }
        ResponseEnvelope::encode(id, &self.player.status())
    }
}

/// Runs a backend over `library` inside this process and returns a bridge
/// talking to it.
pub fn spawn_local(library: Library, mode: PlaybackMode, capacity: usize) -> SignalBridge {
    let (transport, requests) = ChannelTransport::pair(capacity);
    let (outbound, inbound) = mpsc::channel(capacity);
    let bridge = SignalBridge::new(Arc::new(transport), capacity);
    bridge.attach(inbound);
    task::spawn(Backend::new(library, mode, outbound).run(requests));
    bridge
}
