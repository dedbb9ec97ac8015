//! Presentation state machine for one mounted player instance.
//!
//! All state lives in [`SessionState`] plus the observed size. Player
//! callbacks are turned into [`PlayerEvent`]s and folded through
//! [`transition`], which is pure and can be driven without a renderer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{DiagnosticSink, PlayerDiagnostic};
use crate::poster::PlaybackId;

/// The one failure the player can report. Its detail is never shown to users.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("This video does not exist")]
pub struct PlaybackUnavailable {
    pub detail: serde_json::Value,
}

impl PlaybackUnavailable {
    pub const MESSAGE: &'static str = "This video does not exist";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SessionState {
    FallbackLoading,
    Loading,
    Loaded,
    Error(String),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::FallbackLoading | Self::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FallbackLoading => write!(f, "fallback_loading"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Error(_) => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

/// Events emitted by the external player widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    Ready,
    Error {
        #[serde(default)]
        detail: serde_json::Value,
    },
    Size {
        width: u32,
        height: u32,
    },
}

/// Only LOADING reacts to ready/error; LOADED and ERROR hold until remount.
/// Size reports never change the state.
pub fn transition(state: &SessionState, event: &PlayerEvent) -> SessionState {
    match (state, event) {
        (SessionState::Loading, PlayerEvent::Ready) => SessionState::Loaded,
        (SessionState::Loading, PlayerEvent::Error { .. }) => {
            SessionState::Error(PlaybackUnavailable::MESSAGE.to_string())
        }
        (current, _) => current.clone(),
    }
}

pub struct PlaybackSession {
    playback_id: Option<PlaybackId>,
    state: SessionState,
    size: Option<VideoSize>,
    mounted: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("playback_id", &self.playback_id)
            .field("state", &self.state)
            .field("size", &self.size)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl PlaybackSession {
    /// A session whose route has not resolved yet.
    pub fn pending(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            playback_id: None,
            state: SessionState::FallbackLoading,
            size: None,
            mounted: false,
            sink,
        }
    }

    pub fn mounted(playback_id: PlaybackId, sink: Arc<dyn DiagnosticSink>) -> Self {
        let mut session = Self::pending(sink);
        session.resolve(playback_id);
        session
    }

    /// Leave fallback and mount the player for `playback_id`.
    pub fn resolve(&mut self, playback_id: PlaybackId) {
        self.playback_id = Some(playback_id);
        self.mounted = true;
        self.state = SessionState::Loading;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn size(&self) -> Option<VideoSize> {
        self.size
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn unmount(&mut self) {
        if self.mounted {
            debug!(state = %self.state, "Player unmounted");
        }
        self.mounted = false;
    }

    /// Remount the player, re-arming the wait for a fresh ready/error event.
    /// The observed size is kept; it describes the video, not the widget.
    pub fn remount(&mut self) {
        if self.playback_id.is_none() {
            return;
        }
        self.mounted = true;
        self.state = SessionState::Loading;
    }

    pub fn on_ready(&mut self) -> &SessionState {
        self.handle(PlayerEvent::Ready)
    }

    pub fn on_error(&mut self, detail: serde_json::Value) -> &SessionState {
        self.handle(PlayerEvent::Error { detail })
    }

    pub fn on_size(&mut self, size: VideoSize) -> &SessionState {
        self.handle(PlayerEvent::Size {
            width: size.width,
            height: size.height,
        })
    }

    pub fn handle(&mut self, event: PlayerEvent) -> &SessionState {
        let playback_id = match (&self.playback_id, self.mounted) {
            (Some(id), true) => id.clone(),
            _ => {
                debug!(?event, "Dropping player event while unmounted");
                return &self.state;
            }
        };

        match &event {
            PlayerEvent::Error { detail } => {
                self.sink
                    .player_error(PlayerDiagnostic::new(playback_id, detail.clone()));
            }
            PlayerEvent::Size { width, height } => {
                if matches!(self.state, SessionState::Loading | SessionState::Loaded) {
                    self.size = Some(VideoSize {
                        width: *width,
                        height: *height,
                    });
                }
            }
            PlayerEvent::Ready => {}
        }

        let next = transition(&self.state, &event);
        if next != self.state {
            debug!(from = %self.state, to = %next, "Playback state changed");
            self.state = next;
        }
        &self.state
    }
}
