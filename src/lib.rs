//! Per-field text-to-speech helper for flashcard reviews.
//!
//! ```text
//! rendered card ──▶ scanner ──▶ reconcile ──▶ settings store (settings.json)
//!                     │                            ▲
//!                     ▼                            │
//!                  inject buttons           voices (discovery)
//!                     │
//!                     ▼
//!                  playback ──▶ speech capability
//! ```
//!
//! [`addon::TtsAddon`] ties the pieces together for one activation.

pub mod addon;
pub mod config;
pub mod inject;
pub mod playback;
pub mod reconcile;
pub mod scanner;
pub mod speech;
pub mod voices;
