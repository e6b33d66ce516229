//! Round trips through `runed`'s D-Bus interface on a real session bus.
//!
//! These need a bus of their own:
//! `dbus-run-session -- cargo test --test dbus_test -- --ignored`

use rune_bridge::backend::Backend;
use rune_bridge::dbus::{run_dbus_server, DbusTransport};
use rune_bridge::fetch::{fetch_collection_group_summary, fetch_playback_status};
use rune_bridge::library::Library;
use rune_bridge::signals::{
    CollectionGroupSummary, CollectionType, NextRequest, PlayRequest, PlaybackMode,
    PlaybackState, PlaybackStatus,
};
use rune_bridge::{App, SignalBridge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{self, JoinHandle};

const LIBRARY: &str = r#"
[[tracks]]
path = "abba/gold/waterloo.flac"
title = "Waterloo"
artist = "ABBA"
album = "Gold"

[[tracks]]
path = "air/moon_safari/sexy_boy.flac"
title = "Sexy Boy"
artist = "Air"
album = "Moon Safari"

[[tracks]]
path = "bjork/post/army_of_me.flac"
title = "Army of Me"
artist = "Björk"
album = "Post"
"#;

const TIMEOUT: Duration = Duration::from_secs(5);

// Every daemon claims the same bus name.
static BUS: Mutex<()> = Mutex::const_new(());

struct Daemon {
    stop: watch::Sender<()>,
    server: JoinHandle<Result<(), App>>,
}

impl Daemon {
    async fn start() -> Self {
        let library = Library::parse(LIBRARY).unwrap();
        let (request_sender, request_receiver) = mpsc::channel(16);
        let (response_sender, response_receiver) = mpsc::channel(16);
        let (stop, _) = watch::channel(());

        task::spawn(Backend::new(library, PlaybackMode::Loop, response_sender).run(request_receiver));
        let server = task::spawn(run_dbus_server(
            request_sender,
            response_receiver,
            stop.clone(),
        ));

        for _ in 0..100 {
            let (transport, _) = DbusTransport::connect(16).await.unwrap();
            if transport.test_connection().await.is_ok() {
                return Self { stop, server };
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("the bridge never appeared on the bus");
    }

    async fn shut_down(self) {
        self.stop.send(()).unwrap();
        self.server.await.unwrap().unwrap();
    }
}

async fn client() -> SignalBridge {
    let (transport, inbound) = DbusTransport::connect(16).await.unwrap();
    let bridge = SignalBridge::new(Arc::new(transport), 16);
    bridge.attach(inbound);
    bridge
}

fn group(title: &str, count: usize) -> CollectionGroupSummary {
    CollectionGroupSummary {
        group_title: title.to_string(),
        count,
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "needs a D-Bus session bus; run under dbus-run-session"]
async fn single_client_round_trip() {
    let _bus = BUS.lock().await;
    let daemon = Daemon::start().await;
    let bridge = client().await;

    let groups = tokio::time::timeout(
        TIMEOUT,
        fetch_collection_group_summary(&bridge, CollectionType::Artist),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(groups, vec![group("A", 2), group("B", 1)]);

    let status = bridge.request_timeout(&PlayRequest, TIMEOUT).await.unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.title.as_deref(), Some("Waterloo"));
    assert_eq!(bridge.pending_count(), 0);

    daemon.shut_down().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "needs a D-Bus session bus; run under dbus-run-session"]
async fn concurrent_clients_get_their_own_answers() {
    let _bus = BUS.lock().await;
    let daemon = Daemon::start().await;
    let first = client().await;
    let second = client().await;

    // Both clients number their requests from 1, so every round sends the
    // same ids from two callers at once.
    for _ in 0..20 {
        let (summary, status) = tokio::time::timeout(TIMEOUT, async {
            tokio::join!(
                fetch_collection_group_summary(&first, CollectionType::Artist),
                fetch_playback_status(&second),
            )
        })
        .await
        .unwrap();
        assert_eq!(summary.unwrap(), vec![group("A", 2), group("B", 1)]);
        assert_eq!(status.unwrap().queue_len, 3);
    }
    assert_eq!(first.pending_count(), 0);
    assert_eq!(second.pending_count(), 0);

    daemon.shut_down().await;
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "needs a D-Bus session bus; run under dbus-run-session"]
async fn state_changes_reach_every_client() {
    let _bus = BUS.lock().await;
    let daemon = Daemon::start().await;
    let first = client().await;
    let second = client().await;
    let mut watching = second.subscribe::<PlaybackStatus>();

    let answer = first.request_timeout(&NextRequest, TIMEOUT).await.unwrap();
    assert_eq!(answer.index, Some(1));

    // The other client only hears the broadcast, never the answer.
    let broadcast = tokio::time::timeout(TIMEOUT, watching.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(broadcast, answer);
    let nothing_else = tokio::time::timeout(Duration::from_millis(200), watching.next()).await;
    assert!(nothing_else.is_err());

    daemon.shut_down().await;
}
