//! Speech capability seam.
//!
//! The helper never synthesises audio itself. [`SpeechEngine`] is the
//! interface the playback orchestrator calls; the host supplies an
//! implementation backed by the platform's speech synthesis. [`NullSpeech`]
//! is used where no capability exists, degrading to "no sound".

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors reported by a speech capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// The platform offers no speech synthesis at all.
    #[error("speech synthesis is not available on this platform")]
    Unavailable,

    /// The platform rejected or aborted this utterance.
    #[error("utterance failed: {0}")]
    Utterance(String),
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One speak request: text plus the resolved language/voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Field the text came from (for logging).
    pub field_name: String,
    /// Text to read aloud.
    pub text: String,
    /// Language code; empty lets the platform decide.
    pub lang: String,
    /// Voice name; empty selects the platform default voice.
    pub voice: String,
}

impl Utterance {
    /// Returns `true` when there is nothing to say.
    pub fn is_silent(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// Platform speech capability.
///
/// `speak` resolves when the platform signals the end of the utterance. The
/// orchestrator may drop the future early on cancellation, after which it
/// calls [`stop`](SpeechEngine::stop) so the platform silences any audio
/// still queued.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak `utterance`, resolving on the completion signal.
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Silence current output. Default: nothing to stop.
    fn stop(&self) {}
}

// Compile-time assertion: Box<dyn SpeechEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>) {}
};

// ---------------------------------------------------------------------------
// NullSpeech
// ---------------------------------------------------------------------------

/// Speech capability for platforms without one: every call reports
/// [`SpeechError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpeech;

#[async_trait]
impl SpeechEngine for NullSpeech {
    async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        log::debug!(
            "speech: no capability, skipping field {:?}",
            utterance.field_name
        );
        Err(SpeechError::Unavailable)
    }
}
