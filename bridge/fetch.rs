use crate::bridge::SignalBridge;
use crate::error::App;
use crate::signals::{
    CollectionGroup, CollectionGroupSummary, CollectionType, FetchCollectionGroupSummaryRequest,
    FetchCollectionGroupsRequest, FetchPlaybackStatusRequest, PlaybackStatus,
};
use log::info;

/// Asks the backend for the group summary of one collection type and waits
/// for the answer.
pub async fn fetch_collection_group_summary(
    bridge: &SignalBridge,
    collection_type: CollectionType,
) -> Result<Vec<CollectionGroupSummary>, App> {
    info!("Fetching {collection_type:?} group summary");
    let response = bridge
        .request(&FetchCollectionGroupSummaryRequest { collection_type })
        .await?;
    Ok(response.groups)
}

pub async fn fetch_collection_groups(
    bridge: &SignalBridge,
    collection_type: CollectionType,
    group_titles: Vec<String>,
) -> Result<Vec<CollectionGroup>, App> {
    info!("Fetching {} {collection_type:?} groups", group_titles.len());
    let response = bridge
        .request(&FetchCollectionGroupsRequest {
            collection_type,
            group_titles,
        })
        .await?;
    Ok(response.groups)
}

pub async fn fetch_playback_status(bridge: &SignalBridge) -> Result<PlaybackStatus, App> {
    bridge.request(&FetchPlaybackStatusRequest).await
}
