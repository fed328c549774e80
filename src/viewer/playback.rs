use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

/// Why a backend refused to play or unmute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Sound (or playback) is not allowed until the user interacts.
    #[error("playback not allowed before user interaction")]
    NotAllowed,
    /// The backend cannot work at all (player missing, no IPC).
    #[error("player unavailable: {0}")]
    Unavailable(String),
    #[error("playback failed: {0}")]
    Failed(String),
}

/// Something that can play the reel at a rendered feed position.
///
/// Elements are addressed by rendered index, since the same reel can appear
/// at several positions.
pub trait MediaBackend: Send {
    fn play(&mut self, index: usize, url: &Url, muted: bool) -> Result<(), PlaybackError>;
    fn pause(&mut self, index: usize) -> Result<(), PlaybackError>;
    fn set_muted(&mut self, index: usize, muted: bool) -> Result<(), PlaybackError>;
    /// Stop everything; called when the rendered feed is thrown away.
    fn stop_all(&mut self);
}

/// Backend that plays nothing. Used with `player = "none"`.
#[derive(Debug, Default)]
pub struct NullBackend;

impl MediaBackend for NullBackend {
    fn play(&mut self, _index: usize, _url: &Url, _muted: bool) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&mut self, _index: usize) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn set_muted(&mut self, _index: usize, _muted: bool) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn stop_all(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Paused,
    Playing {
        muted: bool,
    },
}

/// Result of [`PlaybackController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Playing,
    /// Sound was refused; playing muted. The caller should schedule an
    /// [`unmute`](PlaybackController::unmute) attempt shortly after.
    PlayingMuted,
    /// Even muted playback was refused; retried on the next interaction.
    Blocked,
    Failed,
}

#[derive(Debug, Clone)]
enum Retry {
    Start(Url),
    Unmute,
}

/// Play/pause bookkeeping plus an autoplay policy.
///
/// With `require_interaction` set, starting with sound before the first
/// user interaction is treated as `NotAllowed`, the way browsers gate
/// autoplay. Elements refused that way are remembered and retried once
/// [`on_user_interaction`](Self::on_user_interaction) is called.
pub struct PlaybackController {
    backend: Box<dyn MediaBackend>,
    require_interaction: bool,
    sound_unlocked: bool,
    user_muted: bool,
    states: BTreeMap<usize, PlayState>,
    awaiting: BTreeMap<usize, Retry>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("require_interaction", &self.require_interaction)
            .field("sound_unlocked", &self.sound_unlocked)
            .field("user_muted", &self.user_muted)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    pub fn new(backend: Box<dyn MediaBackend>, require_interaction: bool) -> Self {
        Self {
            backend,
            require_interaction,
            sound_unlocked: false,
            user_muted: false,
            states: BTreeMap::new(),
            awaiting: BTreeMap::new(),
        }
    }

    fn sound_allowed(&self) -> bool {
        !self.require_interaction || self.sound_unlocked
    }

    fn play_with_sound(&mut self, index: usize, url: &Url) -> Result<(), PlaybackError> {
        if !self.sound_allowed() {
            return Err(PlaybackError::NotAllowed);
        }
        self.backend.play(index, url, false)
    }

    /// Start element `index`, with sound if the policy allows.
    pub fn start(&mut self, index: usize, url: &Url) -> StartOutcome {
        self.awaiting.remove(&index);

        if self.user_muted {
            return match self.backend.play(index, url, true) {
                Ok(()) => {
                    self.states.insert(index, PlayState::Playing { muted: true });
                    StartOutcome::Playing
                }
                Err(e) => self.start_failed(index, url, e),
            };
        }

        match self.play_with_sound(index, url) {
            Ok(()) => {
                self.states.insert(index, PlayState::Playing { muted: false });
                StartOutcome::Playing
            }
            Err(PlaybackError::NotAllowed) => {
                tracing::debug!(index, "Sound refused, retrying muted");
                match self.backend.play(index, url, true) {
                    Ok(()) => {
                        self.states.insert(index, PlayState::Playing { muted: true });
                        StartOutcome::PlayingMuted
                    }
                    Err(e) => self.start_failed(index, url, e),
                }
            }
            Err(e) => self.start_failed(index, url, e),
        }
    }

    fn start_failed(&mut self, index: usize, url: &Url, error: PlaybackError) -> StartOutcome {
        self.states.insert(index, PlayState::Paused);
        if error == PlaybackError::NotAllowed {
            tracing::debug!(index, "Autoplay prevented, waiting for user interaction");
            self.awaiting.insert(index, Retry::Start(url.clone()));
            StartOutcome::Blocked
        } else {
            tracing::debug!(index, %error, "Error playing reel");
            StartOutcome::Failed
        }
    }

    /// Try to unmute an element that was started muted.
    pub fn unmute(&mut self, index: usize) -> bool {
        if self.user_muted || self.state(index) != (PlayState::Playing { muted: true }) {
            return false;
        }
        let result = if self.sound_allowed() {
            self.backend.set_muted(index, false)
        } else {
            Err(PlaybackError::NotAllowed)
        };
        match result {
            Ok(()) => {
                self.states.insert(index, PlayState::Playing { muted: false });
                true
            }
            Err(PlaybackError::NotAllowed) => {
                tracing::debug!(index, "Unmute refused, staying muted until interaction");
                self.awaiting.insert(index, Retry::Unmute);
                false
            }
            Err(error) => {
                tracing::debug!(index, %error, "Unmute failed");
                false
            }
        }
    }

    pub fn pause(&mut self, index: usize) {
        self.awaiting.remove(&index);
        if let Some(state) = self.states.get_mut(&index) {
            if let PlayState::Playing { .. } = state {
                if let Err(error) = self.backend.pause(index) {
                    tracing::debug!(index, %error, "Pause failed");
                }
            }
            *state = PlayState::Paused;
        }
    }

    /// Unlock sound and retry everything that was refused before.
    ///
    /// Returns how many elements were retried.
    pub fn on_user_interaction(&mut self) -> usize {
        self.sound_unlocked = true;
        let pending = std::mem::take(&mut self.awaiting);
        let retried = pending.len();
        for (index, retry) in pending {
            match retry {
                Retry::Start(url) => {
                    self.start(index, &url);
                }
                Retry::Unmute => {
                    self.unmute(index);
                }
            }
        }
        if retried > 0 {
            tracing::debug!(retried, "Retried playback after user interaction");
        }
        retried
    }

    /// Flip the user's mute preference and apply it to whatever is playing.
    pub fn toggle_mute(&mut self) -> bool {
        self.user_muted = !self.user_muted;
        let playing: Vec<usize> = self
            .states
            .iter()
            .filter(|(_, s)| matches!(s, PlayState::Playing { .. }))
            .map(|(i, _)| *i)
            .collect();
        for index in playing {
            if self.user_muted {
                if self.backend.set_muted(index, true).is_ok() {
                    self.states.insert(index, PlayState::Playing { muted: true });
                }
            } else {
                self.unmute(index);
            }
        }
        self.user_muted
    }

    /// Forget every element and stop the backend.
    pub fn reset(&mut self) {
        self.backend.stop_all();
        self.states.clear();
        self.awaiting.clear();
    }

    pub fn state(&self, index: usize) -> PlayState {
        self.states.get(&index).copied().unwrap_or_default()
    }

    pub fn playing(&self) -> impl Iterator<Item = (usize, PlayState)> + '_ {
        self.states
            .iter()
            .filter(|(_, s)| matches!(s, PlayState::Playing { .. }))
            .map(|(i, s)| (*i, *s))
    }

    pub fn is_awaiting_interaction(&self, index: usize) -> bool {
        self.awaiting.contains_key(&index)
    }

    pub fn is_user_muted(&self) -> bool {
        self.user_muted
    }

    pub fn sound_unlocked(&self) -> bool {
        self.sound_unlocked
    }
}
