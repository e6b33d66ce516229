//! Play/pause button behaviour.

use crate::bridge::SignalBridge;
use crate::error::App;
use crate::signals::{PauseRequest, PlayRequest, PlaybackState, PlaybackStatus};
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
}

/// The command a press of the play/pause button issues, if any.
pub fn command_for(state: PlaybackState, disabled: bool) -> Option<PlaybackCommand> {
    if disabled {
        return None;
    }
    match state {
        PlaybackState::Paused | PlaybackState::Stopped => Some(PlaybackCommand::Play),
        PlaybackState::Playing => Some(PlaybackCommand::Pause),
    }
}

/// Sends the signal for one button press. Does not wait for the backend.
pub async fn press_play_pause(
    bridge: &SignalBridge,
    state: PlaybackState,
    disabled: bool,
) -> Result<Option<PlaybackCommand>, App> {
    let Some(command) = command_for(state, disabled) else {
        info!("Play/pause pressed while disabled");
        return Ok(None);
    };
    match command {
        PlaybackCommand::Play => bridge.send(&PlayRequest).await?,
        PlaybackCommand::Pause => bridge.send(&PauseRequest).await?,
    };
    Ok(Some(command))
}

/// Sends the signal for one button press and waits for the backend's
/// answer to it, so the status returned is the one this press caused.
pub async fn press_play_pause_confirmed(
    bridge: &SignalBridge,
    state: PlaybackState,
    disabled: bool,
) -> Result<Option<PlaybackStatus>, App> {
    let Some(command) = command_for(state, disabled) else {
        info!("Play/pause pressed while disabled");
        return Ok(None);
    };
    let status = match command {
        PlaybackCommand::Play => bridge.request(&PlayRequest).await?,
        PlaybackCommand::Pause => bridge.request(&PauseRequest).await?,
    };
    Ok(Some(status))
}

/// Parses a legacy playback state tag, logging the ones nobody knows.
pub fn parse_state_tag(tag: &str) -> Result<PlaybackState, App> {
    tag.parse::<PlaybackState>().inspect_err(|_| {
        warn!("Play/pause pressed in unknown playback state {tag:?}");
    })
}

/// Like [`press_play_pause`] for a state known only by its tag.
pub async fn press_play_pause_tag(
    bridge: &SignalBridge,
    tag: &str,
    disabled: bool,
) -> Result<Option<PlaybackCommand>, App> {
    let state = parse_state_tag(tag)?;
    press_play_pause(bridge, state, disabled).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{RequestEnvelope, ResponseEnvelope};
    use crate::signals::Signal;
    use crate::transport::ChannelTransport;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const STATES: [PlaybackState; 3] = [
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::Stopped,
    ];

    fn bridge() -> (SignalBridge, mpsc::Receiver<RequestEnvelope>) {
        let (transport, requests) = ChannelTransport::pair(8);
        (SignalBridge::new(Arc::new(transport), 8), requests)
    }

    fn sent(requests: &mut mpsc::Receiver<RequestEnvelope>) -> Vec<String> {
        let mut names = Vec::new();
        while let Ok(envelope) = requests.try_recv() {
            names.push(envelope.name);
        }
        names
    }

    #[test]
    fn disabled_never_issues_a_command() {
        for state in STATES {
            assert_eq!(command_for(state, true), None);
        }
    }

    #[test]
    fn enabled_button_toggles() {
        assert_eq!(command_for(PlaybackState::Paused, false), Some(PlaybackCommand::Play));
        assert_eq!(command_for(PlaybackState::Stopped, false), Some(PlaybackCommand::Play));
        assert_eq!(command_for(PlaybackState::Playing, false), Some(PlaybackCommand::Pause));
    }

    #[tokio::test]
    async fn disabled_press_sends_nothing() {
        let (bridge, mut requests) = bridge();
        for state in STATES {
            assert_eq!(press_play_pause(&bridge, state, true).await.unwrap(), None);
        }
        assert!(sent(&mut requests).is_empty());
    }

    #[tokio::test]
    async fn paused_and_stopped_send_one_play() {
        for state in [PlaybackState::Paused, PlaybackState::Stopped] {
            let (bridge, mut requests) = bridge();
            let command = press_play_pause(&bridge, state, false).await.unwrap();
            assert_eq!(command, Some(PlaybackCommand::Play));
            assert_eq!(sent(&mut requests), vec![PlayRequest::NAME.to_string()]);
        }
    }

    #[tokio::test]
    async fn playing_sends_one_pause() {
        let (bridge, mut requests) = bridge();
        let command = press_play_pause(&bridge, PlaybackState::Playing, false)
            .await
            .unwrap();
        assert_eq!(command, Some(PlaybackCommand::Pause));
        assert_eq!(sent(&mut requests), vec![PauseRequest::NAME.to_string()]);
    }

    #[tokio::test]
    async fn unknown_tag_sends_nothing_and_is_reported() {
        let (bridge, mut requests) = bridge();
        let err = press_play_pause_tag(&bridge, "Buffering", false)
            .await
            .unwrap_err();
        assert!(matches!(err, App::UnknownState(tag) if tag == "Buffering"));
        assert!(sent(&mut requests).is_empty());
    }

    #[tokio::test]
    async fn known_tag_dispatches() {
        let (bridge, mut requests) = bridge();
        let command = press_play_pause_tag(&bridge, "Stopped", false).await.unwrap();
        assert_eq!(command, Some(PlaybackCommand::Play));
        assert_eq!(sent(&mut requests), vec![PlayRequest::NAME.to_string()]);
    }

    #[tokio::test]
    async fn confirmed_press_returns_the_answer_to_its_own_request() {
        let (bridge, mut requests) = bridge();
        let press = tokio::spawn({
            let bridge = bridge.clone();
            async move { press_play_pause_confirmed(&bridge, PlaybackState::Playing, false).await }
        });

        let envelope = requests.recv().await.unwrap();
        assert_eq!(envelope.name, PauseRequest::NAME);
        let answer = |state| PlaybackStatus {
            state,
            mode: crate::signals::PlaybackMode::Loop,
            index: Some(0),
            title: None,
            queue_len: 1,
        };
        // Someone else's status first, then the answer to this press.
        bridge.deliver(ResponseEnvelope::unsolicited(&answer(PlaybackState::Stopped)).unwrap());
        bridge.deliver(ResponseEnvelope::encode(envelope.id + 100, &answer(PlaybackState::Playing)).unwrap());
        bridge.deliver(ResponseEnvelope::encode(envelope.id, &answer(PlaybackState::Paused)).unwrap());

        let status = press.await.unwrap().unwrap().unwrap();
        assert_eq!(status.state, PlaybackState::Paused);
    }

    #[tokio::test]
    async fn confirmed_press_while_disabled_sends_nothing() {
        let (bridge, mut requests) = bridge();
        for state in STATES {
            let status = press_play_pause_confirmed(&bridge, state, true).await.unwrap();
            assert_eq!(status, None);
        }
        assert!(sent(&mut requests).is_empty());
    }

    #[test]
    fn state_tags_parse_or_fail() {
        assert_eq!(parse_state_tag("Paused").unwrap(), PlaybackState::Paused);
        assert!(matches!(parse_state_tag("paused"), Err(App::UnknownState(_))));
    }
}
