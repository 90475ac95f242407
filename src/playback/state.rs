//! Playback state machine and shared status.
//!
//! [`SharedPlayback`] is a type alias for `Arc<Mutex<PlaybackStatus>>`, cheap
//! to clone and readable by the host UI (e.g. to toggle a stop button).

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// States of a playback session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing is being read.
    #[default]
    Idle,

    /// Region `index` of the current queue is being spoken.
    Speaking { index: usize, field_name: String },

    /// The session was stopped or preempted; `Idle` follows immediately.
    Cancelled,
}

impl PlaybackState {
    /// Returns `true` while a region is being spoken.
    ///
    /// ```
    /// use tts_field_helper::playback::PlaybackState;
    ///
    /// assert!(!PlaybackState::Idle.is_busy());
    /// assert!(PlaybackState::Speaking { index: 0, field_name: "Front".into() }.is_busy());
    /// assert!(!PlaybackState::Cancelled.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PlaybackState::Speaking { .. })
    }

    /// A short label for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Speaking { .. } => "Speaking",
            PlaybackState::Cancelled => "Cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackStatus
// ---------------------------------------------------------------------------

/// What the host can observe about playback.
#[derive(Debug, Clone, Default)]
pub struct PlaybackStatus {
    /// Current state.
    pub state: PlaybackState,

    /// Most recent single-field speech failure, if any.
    pub last_error: Option<String>,

    /// Number of sessions started since activation.
    pub sessions: u64,
}

/// Thread-safe handle to [`PlaybackStatus`]. Do not hold the lock across
/// `.await` points.
pub type SharedPlayback = Arc<Mutex<PlaybackStatus>>;

/// Construct a new [`SharedPlayback`] in the `Idle` state.
pub fn new_shared_playback() -> SharedPlayback {
    Arc::new(Mutex::new(PlaybackStatus::default()))
}
