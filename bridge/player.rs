use crate::error::App;
use crate::library::Track;
use crate::signals::{PlaybackMode, PlaybackState, PlaybackStatus};
use log::info;
use rand::rng;
use rand::seq::IteratorRandom;

/// Playback state over a queue of tracks. No audio is produced here; the
/// player only tracks what the engine would be doing.
#[derive(Debug, Clone)]
pub struct Player {
    queue: Vec<Track>,
    index: usize,
    state: PlaybackState,
    mode: PlaybackMode,
}

impl Player {
    pub fn new(queue: Vec<Track>, mode: PlaybackMode) -> Self {
        Self {
            queue,
            index: 0,
            state: PlaybackState::Stopped,
            mode,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.get(self.index)
    }

    pub fn status(&self) -> PlaybackStatus {
        let track = self.current_track();
        PlaybackStatus {
            state: self.state,
            mode: self.mode,
            index: track.map(|_| self.index),
            title: track.map(|track| track.title.clone()),
            queue_len: self.queue.len(),
        }
    }

    pub fn play(&mut self) {
        if self.queue.is_empty() {
            info!("Play requested with an empty queue");
            return;
        }
        info!("Resume playback");
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            info!("Pause");
            self.state = PlaybackState::Paused;
        }
    }

    pub fn stop(&mut self) {
        info!("Stop");
        self.state = PlaybackState::Stopped;
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn next(&mut self) -> Result<usize, App> {
        let len = self.queue_len()?;
        self.index = match self.mode {
            PlaybackMode::Loop | PlaybackMode::Repeat => (self.index + 1) % len,
            PlaybackMode::Shuffle => random_index(len)?,
        };
        self.resume_after_skip();
        Ok(self.index)
    }

    pub fn previous(&mut self) -> Result<usize, App> {
        let len = self.queue_len()?;
        self.index = match self.mode {
            PlaybackMode::Loop | PlaybackMode::Repeat => {
                if self.index == 0 {
                    len - 1
                } else {
                    self.index - 1
                }
            }
            PlaybackMode::Shuffle => random_index(len)?,
        };
        self.resume_after_skip();
        Ok(self.index)
    }

    fn queue_len(&self) -> Result<usize, App> {
        match self.queue.len() {
            0 => Err(App::InvalidInput("the play queue is empty".to_string())),
            len => Ok(len),
        }
    }

    fn resume_after_skip(&mut self) {
        if self.state == PlaybackState::Stopped {
            self.state = PlaybackState::Playing;
        }
        if let Some(track) = self.current_track() {
            info!("Now at {} ({})", track.title, self.index);
        }
    }
}

fn random_index(len: usize) -> Result<usize, App> {
    let mut rng = rng();
    (0..len)
        .choose(&mut rng)
        .ok_or_else(|| App::DataParsing("Failed to choose random track".to_string()))
}
