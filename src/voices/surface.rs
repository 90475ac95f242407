//! Sandboxed rendering surface used to enumerate platform voices.
//!
//! A surface is scarce and short-lived: it is created for one discovery call
//! and torn down when the call ends. [`SurfaceGuard`] ties teardown to scope
//! so every exit path (ready, timeout, error) releases it.

use std::ops::{Deref, DerefMut};

use tokio::sync::mpsc::UnboundedSender;

use super::catalog::BRIDGE_PREFIX;
use super::VoiceError;

/// A hidden rendering surface able to run the voice probe.
///
/// After [`load_probe`](VoiceSurface::load_probe) the surface posts bridge
/// messages on `bridge` once the platform signals its voices are ready. A
/// surface whose platform lacks speech synthesis simply never posts (or
/// drops the sender).
pub trait VoiceSurface: Send {
    /// Load the probe and start listening for the readiness signal.
    fn load_probe(&mut self, bridge: UnboundedSender<String>) -> Result<(), VoiceError>;

    /// Release the surface. Called exactly once, by [`SurfaceGuard`].
    fn teardown(&mut self);
}

/// Creates surfaces on demand.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn VoiceSurface>, VoiceError>;
}

// ---------------------------------------------------------------------------
// SurfaceGuard
// ---------------------------------------------------------------------------

/// Owns a surface for one discovery call; tears it down on drop.
pub struct SurfaceGuard {
    surface: Box<dyn VoiceSurface>,
}

impl SurfaceGuard {
    pub fn new(surface: Box<dyn VoiceSurface>) -> Self {
        Self { surface }
    }
}

impl Deref for SurfaceGuard {
    type Target = dyn VoiceSurface;

    fn deref(&self) -> &Self::Target {
        self.surface.as_ref()
    }
}

impl DerefMut for SurfaceGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.surface.as_mut()
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.surface.teardown();
        log::debug!("voices: surface torn down");
    }
}

// ---------------------------------------------------------------------------
// StaticSurface
// ---------------------------------------------------------------------------

/// Surface for hosts that already know their voice list (or know they have
/// none). Posts `voices:<payload>` immediately on load; with no payload it
/// behaves like a platform without speech synthesis.
#[derive(Debug, Clone, Default)]
pub struct StaticSurface {
    payload: Option<String>,
    bridge: Option<UnboundedSender<String>>,
}

impl StaticSurface {
    pub fn new(payload: Option<String>) -> Self {
        Self {
            payload,
            bridge: None,
        }
    }
}

impl VoiceSurface for StaticSurface {
    fn load_probe(&mut self, bridge: UnboundedSender<String>) -> Result<(), VoiceError> {
        if let Some(payload) = &self.payload {
            bridge
                .send(format!("{BRIDGE_PREFIX}{payload}"))
                .map_err(|e| VoiceError::ProbeLoad(e.to_string()))?;
            self.bridge = Some(bridge);
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.bridge = None;
    }
}

/// Factory handing out [`StaticSurface`]s with a fixed payload.
#[derive(Debug, Clone, Default)]
pub struct StaticSurfaceFactory {
    payload: Option<String>,
}

impl StaticSurfaceFactory {
    /// `payload` is the JSON array of `{name, lang}` objects, without prefix.
    pub fn new(payload: Option<String>) -> Self {
        Self { payload }
    }
}

impl SurfaceFactory for StaticSurfaceFactory {
    fn create(&self) -> Result<Box<dyn VoiceSurface>, VoiceError> {
        Ok(Box::new(StaticSurface::new(self.payload.clone())))
    }
}
