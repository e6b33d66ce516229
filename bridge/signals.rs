//! Messages exchanged between the player front end and the backend.
//!
//! Every message carries a stable `NAME` that identifies it inside an
//! envelope. Requests additionally name the single response type the
//! backend answers them with.

use crate::error::App;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A typed message that can cross the front end / backend boundary.
pub trait Signal: Serialize + DeserializeOwned + Send + 'static {
    const NAME: &'static str;
}

/// A signal sent by the front end that the backend answers exactly once.
pub trait Request: Signal {
    type Response: Signal;
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackState {
    type Err = App;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "Playing" => Ok(PlaybackState::Playing),
            "Paused" => Ok(PlaybackState::Paused),
            "Stopped" => Ok(PlaybackState::Stopped),
            other => Err(App::UnknownState(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Loop,
    Shuffle,
    Repeat,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionType {
    Album,
    Artist,
    Directory,
    Playlist,
}

impl FromStr for CollectionType {
    type Err = App;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "album" | "albums" => Ok(CollectionType::Album),
            "artist" | "artists" => Ok(CollectionType::Artist),
            "directory" | "directories" => Ok(CollectionType::Directory),
            "playlist" | "playlists" => Ok(CollectionType::Playlist),
            _ => Err(App::UnknownCollectionType(value.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionGroupSummary {
    pub group_title: String,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub track_count: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionGroup {
    pub group_title: String,
    pub collections: Vec<Collection>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PlayRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PauseRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct StopRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct NextRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PreviousRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SetPlaybackModeRequest {
    pub mode: PlaybackMode,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct FetchPlaybackStatusRequest;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FetchCollectionGroupSummaryRequest {
    pub collection_type: CollectionType,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FetchCollectionGroupsRequest {
    pub collection_type: CollectionType,
    pub group_titles: Vec<String>,
}

/// Snapshot of the player, sent as the answer to every transport command
/// and broadcast unsolicited whenever the playback state changes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub mode: PlaybackMode,
    pub index: Option<usize>,
    pub title: Option<String>,
    pub queue_len: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionGroupSummaryResponse {
    pub collection_type: CollectionType,
    pub groups: Vec<CollectionGroupSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionGroupsResponse {
    pub collection_type: CollectionType,
    pub groups: Vec<CollectionGroup>,
}

/// Sent in place of the regular response when a request can't be served.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BackendError {
    pub message: String,
}

impl Signal for PlayRequest {
    const NAME: &'static str = "PlayRequest";
}

impl Request for PlayRequest {
    type Response = PlaybackStatus;
}

impl Signal for PauseRequest {
    const NAME: &'static str = "PauseRequest";
}

impl Request for PauseRequest {
    type Response = PlaybackStatus;
}

impl Signal for StopRequest {
    const NAME: &'static str = "StopRequest";
}

impl Request for StopRequest {
    type Response = PlaybackStatus;
}

impl Signal for NextRequest {
    const NAME: &'static str = "NextRequest";
}

impl Request for NextRequest {
    type Response = PlaybackStatus;
}

impl Signal for PreviousRequest {
    const NAME: &'static str = "PreviousRequest";
}

impl Request for PreviousRequest {
    type Response = PlaybackStatus;
}

impl Signal for SetPlaybackModeRequest {
    const NAME: &'static str = "SetPlaybackModeRequest";
}

impl Request for SetPlaybackModeRequest {
    type Response = PlaybackStatus;
}

impl Signal for FetchPlaybackStatusRequest {
    const NAME: &'static str = "FetchPlaybackStatusRequest";
}

impl Request for FetchPlaybackStatusRequest {
    type Response = PlaybackStatus;
}

impl Signal for FetchCollectionGroupSummaryRequest {
    const NAME: &'static str = "FetchCollectionGroupSummaryRequest";
}

impl Request for FetchCollectionGroupSummaryRequest {
    type Response = CollectionGroupSummaryResponse;
}

impl Signal for FetchCollectionGroupsRequest {
    const NAME: &'static str = "FetchCollectionGroupsRequest";
}

impl Request for FetchCollectionGroupsRequest {
    type Response = CollectionGroupsResponse;
}

impl Signal for PlaybackStatus {
    const NAME: &'static str = "PlaybackStatus";
}

impl Signal for CollectionGroupSummaryResponse {
    const NAME: &'static str = "CollectionGroupSummaryResponse";
}

impl Signal for CollectionGroupsResponse {
    const NAME: &'static str = "CollectionGroupsResponse";
}

impl Signal for BackendError {
    const NAME: &'static str = "BackendError";
}
