//! Voice resolver — drives a surface to enumerate voices with a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, OnceCell};

use super::catalog::{VoiceCatalog, BRIDGE_PREFIX};
use super::surface::{SurfaceFactory, SurfaceGuard};
use super::VoiceError;

// ---------------------------------------------------------------------------
// VoiceResolver
// ---------------------------------------------------------------------------

/// Enumerates platform voices through a freshly created surface per call.
///
/// Results may differ between calls (platforms add voices lazily); callers
/// must tolerate that.
#[derive(Clone)]
pub struct VoiceResolver {
    factory: Arc<dyn SurfaceFactory>,
    timeout: Duration,
}

impl VoiceResolver {
    pub fn new(factory: Arc<dyn SurfaceFactory>, timeout: Duration) -> Self {
        Self { factory, timeout }
    }

    /// Discover the voice catalog.
    ///
    /// Resolves to an empty catalog when the platform lacks the capability,
    /// stays silent past the timeout, or reports garbage.
    pub async fn discover(&self) -> VoiceCatalog {
        match self.try_discover().await {
            Ok(catalog) => {
                log::info!(
                    "voices: discovered {} language(s)",
                    catalog.languages().count()
                );
                catalog
            }
            Err(e) => {
                log::warn!("voices: discovery unavailable ({e})");
                VoiceCatalog::default()
            }
        }
    }

    async fn try_discover(&self) -> Result<VoiceCatalog, VoiceError> {
        let (bridge_tx, mut bridge_rx) = mpsc::unbounded_channel::<String>();

        // Dropped (and torn down) on every return below.
        let mut surface = SurfaceGuard::new(self.factory.create()?);
        surface.load_probe(bridge_tx)?;

        let ready = async {
            while let Some(message) = bridge_rx.recv().await {
                match message.strip_prefix(BRIDGE_PREFIX) {
                    Some(payload) => return Some(payload.to_string()),
                    None => log::debug!("voices: ignoring bridge message {message:?}"),
                }
            }
            None
        };

        match tokio::time::timeout(self.timeout, ready).await {
            Ok(Some(payload)) => VoiceCatalog::from_bridge_payload(&payload),
            Ok(None) => {
                log::debug!("voices: surface closed without a readiness signal");
                Ok(VoiceCatalog::default())
            }
            Err(_) => {
                log::warn!(
                    "voices: no readiness signal within {} ms",
                    self.timeout.as_millis()
                );
                Ok(VoiceCatalog::default())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceDiscovery
// ---------------------------------------------------------------------------

/// Runs the resolver at most once and remembers the result. Create a new
/// one for each activation.
pub struct VoiceDiscovery {
    resolver: VoiceResolver,
    result: OnceCell<VoiceCatalog>,
}

impl VoiceDiscovery {
    pub fn new(resolver: VoiceResolver) -> Self {
        Self {
            resolver,
            result: OnceCell::new(),
        }
    }

    /// Discover on first call; later (or concurrent) calls share that result.
    pub async fn run_once(&self) -> &VoiceCatalog {
        self.result
            .get_or_init(|| self.resolver.discover())
            .await
    }

    pub fn resolver(&self) -> &VoiceResolver {
        &self.resolver
    }

    /// The result, if discovery already finished.
    pub fn cached(&self) -> Option<&VoiceCatalog> {
        self.result.get()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voices::surface::{StaticSurfaceFactory, VoiceSurface};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::UnboundedSender;

    /// Surface that keeps the bridge open but never signals readiness.
    struct SilentSurface {
        bridge: Option<UnboundedSender<String>>,
        teardowns: Arc<AtomicUsize>,
    }

    impl VoiceSurface for SilentSurface {
        fn load_probe(&mut self, bridge: UnboundedSender<String>) -> Result<(), VoiceError> {
            let _ = bridge.send("log:probe started".into());
            self.bridge = Some(bridge);
            Ok(())
        }

        fn teardown(&mut self) {
            self.bridge = None;
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct SilentFactory {
        created: Arc<AtomicUsize>,
        teardowns: Arc<AtomicUsize>,
    }

    impl SurfaceFactory for SilentFactory {
        fn create(&self) -> Result<Box<dyn VoiceSurface>, VoiceError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SilentSurface {
                bridge: None,
                teardowns: Arc::clone(&self.teardowns),
            }))
        }
    }

    struct BrokenFactory;

    impl SurfaceFactory for BrokenFactory {
        fn create(&self) -> Result<Box<dyn VoiceSurface>, VoiceError> {
            Err(VoiceError::SurfaceCreate("no webview".into()))
        }
    }

    fn silent() -> (VoiceResolver, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let teardowns = Arc::new(AtomicUsize::new(0));
        let factory = SilentFactory {
            created: Arc::clone(&created),
            teardowns: Arc::clone(&teardowns),
        };
        (
            VoiceResolver::new(Arc::new(factory), Duration::from_millis(50)),
            created,
            teardowns,
        )
    }

    #[tokio::test]
    async fn ready_surface_yields_catalog() {
        let factory = StaticSurfaceFactory::new(Some(
            r#"[{"name":"Alex","lang":"en-US"},{"name":"Kyoko","lang":"ja-JP"}]"#.into(),
        ));
        let resolver = VoiceResolver::new(Arc::new(factory), Duration::from_secs(1));

        let catalog = resolver.discover().await;
        assert_eq!(catalog.voices("en-US").unwrap(), ["Alex"]);
        assert_eq!(catalog.voices("ja-JP").unwrap(), ["Kyoko"]);
    }

    #[tokio::test]
    async fn silent_surface_times_out_to_empty_and_tears_down() {
        let (resolver, created, teardowns) = silent();

        let catalog = resolver.discover().await;
        assert!(catalog.is_empty());
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_capability_yields_empty_without_waiting() {
        let resolver = VoiceResolver::new(
            Arc::new(StaticSurfaceFactory::new(None)),
            Duration::from_secs(3600),
        );
        assert!(resolver.discover().await.is_empty());
    }

    #[tokio::test]
    async fn surface_creation_failure_yields_empty() {
        let resolver = VoiceResolver::new(Arc::new(BrokenFactory), Duration::from_millis(10));
        assert!(resolver.discover().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_yields_empty() {
        let resolver = VoiceResolver::new(
            Arc::new(StaticSurfaceFactory::new(Some("not json".into()))),
            Duration::from_secs(1),
        );
        assert!(resolver.discover().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_discover_creates_fresh_surfaces() {
        let (resolver, created, teardowns) = silent();
        resolver.discover().await;
        resolver.discover().await;
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(teardowns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn discovery_runs_at_most_once() {
        let (resolver, created, _) = silent();
        let discovery = VoiceDiscovery::new(resolver);
        assert!(discovery.cached().is_none());

        discovery.run_once().await;
        discovery.run_once().await;

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(discovery.cached().is_some());
    }
}
