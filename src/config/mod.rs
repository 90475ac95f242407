//! Configuration module for the TTS field helper.
//!
//! Provides [`ConfigDocument`] (the persisted settings document edited by the
//! settings GUI), [`FieldRule`] (per note-type/field speech settings),
//! [`SettingsStore`] (atomic JSON persistence with a single-writer critical
//! section), [`RuntimeConfig`] (TOML runtime options) and [`AppPaths`] for
//! cross-platform locations.

pub mod paths;
pub mod runtime;
pub mod settings;
pub mod store;

pub use paths::AppPaths;
pub use runtime::RuntimeConfig;
pub use settings::{ConfigDocument, FieldRule, FieldSettings, VoiceMap};
pub use store::{SettingsStore, StoreError};
