//! End-to-end tests against a backend running in the same process.

use rune_bridge::backend::spawn_local;
use rune_bridge::dispatch::{press_play_pause, press_play_pause_confirmed, PlaybackCommand};
use rune_bridge::fetch::{
    fetch_collection_group_summary, fetch_collection_groups, fetch_playback_status,
};
use rune_bridge::library::Library;
use rune_bridge::signals::{
    CollectionGroupSummary, CollectionType, NextRequest, PlaybackMode, PlaybackState,
    PlaybackStatus, SetPlaybackModeRequest,
};
use rune_bridge::{App, SignalBridge};
use std::io::Write;
use std::time::Duration;

const LIBRARY: &str = r#"
[[tracks]]
path = "music/abba/gold/dancing_queen.flac"
title = "Dancing Queen"
artist = "ABBA"
album = "Gold"

[[tracks]]
path = "music/bjork/post/army_of_me.flac"
title = "Army of Me"
artist = "Björk"
album = "Post"

[[tracks]]
path = "music/air/moon_safari/sexy_boy.flac"
title = "Sexy Boy"
artist = "Air"
album = "Moon Safari"
"#;

const TIMEOUT: Duration = Duration::from_secs(2);

fn local(library: &str) -> SignalBridge {
    spawn_local(Library::parse(library).unwrap(), PlaybackMode::Loop, 16)
}

fn group(title: &str, count: usize) -> CollectionGroupSummary {
    CollectionGroupSummary {
        group_title: title.to_string(),
        count,
    }
}

#[tokio::test]
async fn summary_round_trip() {
    let bridge = local(LIBRARY);
    let groups = fetch_collection_group_summary(&bridge, CollectionType::Artist)
        .await
        .unwrap();
    assert_eq!(groups, vec![group("A", 2), group("B", 1)]);
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn groups_round_trip() {
    let bridge = local(LIBRARY);
    let groups = fetch_collection_groups(&bridge, CollectionType::Album, vec!["M".to_string()])
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].collections[0].name, "Moon Safari");
    assert_eq!(groups[0].collections[0].track_count, 1);
}

#[tokio::test]
async fn play_pause_button_drives_the_player() {
    let bridge = local(LIBRARY);

    let status = fetch_playback_status(&bridge).await.unwrap();
    assert_eq!(status.state, PlaybackState::Stopped);

    let changes = bridge.subscribe::<PlaybackStatus>();
    let sent = press_play_pause(&bridge, status.state, false).await.unwrap();
    assert_eq!(sent, Some(PlaybackCommand::Play));
    let status = tokio::time::timeout(TIMEOUT, changes.first())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.title.as_deref(), Some("Dancing Queen"));

    let sent = press_play_pause(&bridge, status.state, false).await.unwrap();
    assert_eq!(sent, Some(PlaybackCommand::Pause));
    let status = fetch_playback_status(&bridge).await.unwrap();
    assert_eq!(status.state, PlaybackState::Paused);
}

#[tokio::test]
async fn confirmed_presses_report_the_state_they_caused() {
    let bridge = local(LIBRARY);
    let observer = bridge.clone();
    let mut changes = observer.subscribe::<PlaybackStatus>();

    let playing = press_play_pause_confirmed(&bridge, PlaybackState::Stopped, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(playing.state, PlaybackState::Playing);
    let paused = press_play_pause_confirmed(&bridge, playing.state, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paused.state, PlaybackState::Paused);
    assert_eq!(bridge.pending_count(), 0);

    // Observers still see every change.
    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(changes.next().await.unwrap().unwrap().state);
    }
    assert_eq!(
        seen,
        vec![
            PlaybackState::Playing,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Paused,
        ]
    );
}

#[tokio::test]
async fn disabled_button_leaves_the_player_alone() {
    let bridge = local(LIBRARY);
    let sent = press_play_pause(&bridge, PlaybackState::Stopped, true)
        .await
        .unwrap();
    assert_eq!(sent, None);
    let status = fetch_playback_status(&bridge).await.unwrap();
    assert_eq!(status.state, PlaybackState::Stopped);
}

#[tokio::test]
async fn state_changes_reach_every_subscriber() {
    let bridge = local(LIBRARY);
    let mut first = bridge.subscribe::<PlaybackStatus>();
    let mut second = bridge.subscribe::<PlaybackStatus>();

    bridge.request(&NextRequest).await.unwrap();

    for stream in [&mut first, &mut second] {
        // The correlated answer, then the unsolicited broadcast.
        let answer = stream.next().await.unwrap().unwrap();
        let broadcast = stream.next().await.unwrap().unwrap();
        assert_eq!(answer, broadcast);
        assert_eq!(broadcast.state, PlaybackState::Playing);
        assert_eq!(broadcast.index, Some(1));
    }
}

#[tokio::test]
async fn concurrent_requests_are_not_confused() {
    let bridge = local(LIBRARY);
    let (albums, artists, status) = tokio::join!(
        fetch_collection_group_summary(&bridge, CollectionType::Album),
        fetch_collection_group_summary(&bridge, CollectionType::Artist),
        bridge.request(&SetPlaybackModeRequest {
            mode: PlaybackMode::Shuffle
        }),
    );
    assert_eq!(albums.unwrap(), vec![group("G", 1), group("M", 1), group("P", 1)]);
    assert_eq!(artists.unwrap(), vec![group("A", 2), group("B", 1)]);
    assert_eq!(status.unwrap().mode, PlaybackMode::Shuffle);
}

#[tokio::test]
async fn backend_errors_are_reported_to_the_caller() {
    let bridge = local("");
    let err = bridge.request(&NextRequest).await.unwrap_err();
    assert!(matches!(err, App::Backend(message) if message.contains("empty")));
}

#[tokio::test]
async fn empty_library_keeps_the_player_stopped() {
    let bridge = local("");
    let status = fetch_playback_status(&bridge).await.unwrap();
    assert_eq!(status.queue_len, 0);
    press_play_pause(&bridge, status.state, false).await.unwrap();
    let status = fetch_playback_status(&bridge).await.unwrap();
    assert_eq!(status.state, PlaybackState::Stopped);
}

#[tokio::test]
async fn library_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LIBRARY.as_bytes()).unwrap();
    let library = Library::load_from_file(file.path()).await.unwrap();
    assert_eq!(library.tracks.len(), 3);
    assert_eq!(library.tracks[1].artist.as_deref(), Some("Björk"));
}
