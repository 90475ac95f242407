//! Playback orchestrator — reads a card's speakable fields one after another.
//!
//! # State machine
//!
//! ```text
//! Idle ──play──▶ Speaking(0) ──done──▶ Speaking(1) ──done──▶ … ──▶ Idle
//!                     │
//!                     └──stop / new play──▶ Cancelled ──▶ Idle
//! ```
//!
//! Only one session is active at a time: a new [`PlaybackOrchestrator::play`]
//! cancels the running session and waits for it to reach `Idle` before the
//! first new utterance starts, so audio never overlaps.

pub mod runner;
pub mod state;

pub use runner::{NoteTypeRules, PlaybackHandle, PlaybackOrchestrator, PlaybackReport, RuleLookup};
pub use state::{new_shared_playback, PlaybackState, PlaybackStatus, SharedPlayback};
