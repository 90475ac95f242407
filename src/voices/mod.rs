//! Voice catalog discovery.
//!
//! # Architecture
//!
//! ```text
//! SurfaceFactory::create()  ──▶ SurfaceGuard (teardown on drop)
//!        │
//!        ├─ load_probe(bridge_tx)   surface enumerates platform voices
//!        │
//!        ▼
//! bridge_rx ── "voices:[{name, lang}, …]" ──▶ VoiceCatalog (lang → names)
//!        │
//!        └─ no message before timeout / surface gone ──▶ empty catalog
//! ```
//!
//! [`VoiceResolver::discover`] never fails: a missing capability, a silent
//! surface or a malformed payload all yield an empty [`VoiceCatalog`], which
//! downstream code treats as "auto-detection unavailable".
//! [`VoiceDiscovery`] runs the resolver at most once per activation.

pub mod catalog;
pub mod resolver;
pub mod surface;

pub use catalog::{PlatformVoice, VoiceCatalog, BRIDGE_PREFIX};
pub use resolver::{VoiceDiscovery, VoiceResolver};
pub use surface::{StaticSurface, StaticSurfaceFactory, SurfaceFactory, SurfaceGuard, VoiceSurface};

use thiserror::Error;

/// Errors inside voice discovery. Never escapes [`VoiceResolver::discover`].
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The sandboxed surface could not be created.
    #[error("cannot create voice surface: {0}")]
    SurfaceCreate(String),

    /// The surface refused to load the voice probe.
    #[error("cannot load voice probe: {0}")]
    ProbeLoad(String),

    /// The bridge payload was not the expected JSON array.
    #[error("malformed voice payload: {0}")]
    Payload(#[from] serde_json::Error),
}
