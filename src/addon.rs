//! Add-on lifecycle — wires the store, discovery, scanner, injector and
//! playback for one activation.
//!
//! # Render flow
//!
//! ```text
//! on_card_render(card)
//!   ├─ snapshot settings            (enabled == false → markup unchanged)
//!   ├─ scan snapshot                (unregistered fields are not read yet)
//!   ├─ register observed fields     (one atomic write, only if anything is new)
//!   ├─ prune note type              (when the host supplied its field list)
//!   ├─ inject buttons               → augmented markup
//!   └─ auto-play                    (opt-in, reads the same regions)
//! ```
//!
//! A button click maps to [`TtsAddon::play_field`]. Voice discovery runs once
//! per activation in the background; its result is merged into the store as
//! soon as it resolves.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::config::{ConfigDocument, RuntimeConfig, SettingsStore, StoreError};
use crate::inject::ButtonInjector;
use crate::playback::{NoteTypeRules, PlaybackHandle, PlaybackOrchestrator, SharedPlayback};
use crate::reconcile::{merge_catalog, prune_note_type, register_fields, ObservedField};
use crate::scanner::{observed_field_names, CardSide, FieldRegion, FieldScanner};
use crate::speech::SpeechEngine;
use crate::voices::{SurfaceFactory, VoiceCatalog, VoiceDiscovery, VoiceResolver};

// ---------------------------------------------------------------------------
// RenderedCard
// ---------------------------------------------------------------------------

/// A card side as the host rendered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub note_type_id: String,
    pub side: CardSide,
    pub markup: String,
    /// Full field list of the note type, when the host knows it. Enables
    /// pruning of rules for fields that were removed from the note type.
    pub note_fields: Option<Vec<String>>,
}

impl RenderedCard {
    pub fn new(note_type_id: impl Into<String>, side: CardSide, markup: impl Into<String>) -> Self {
        Self {
            note_type_id: note_type_id.into(),
            side,
            markup: markup.into(),
            note_fields: None,
        }
    }

    pub fn with_note_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.note_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

// ---------------------------------------------------------------------------
// TtsAddon
// ---------------------------------------------------------------------------

/// One activation of the helper. Construct on activation, drop (or
/// [`deactivate`](TtsAddon::deactivate)) on shutdown.
///
/// Must be used from within a tokio runtime.
pub struct TtsAddon {
    store: Arc<SettingsStore>,
    discovery: Mutex<Arc<VoiceDiscovery>>,
    scanner: FieldScanner,
    injector: ButtonInjector,
    playback: PlaybackOrchestrator,
    auto_play: bool,
    discovery_task: Mutex<Option<JoinHandle<()>>>,
}

impl TtsAddon {
    pub fn new(
        store: Arc<SettingsStore>,
        resolver: VoiceResolver,
        speech: Arc<dyn SpeechEngine>,
    ) -> Self {
        Self {
            store,
            discovery: Mutex::new(Arc::new(VoiceDiscovery::new(resolver))),
            scanner: FieldScanner::default(),
            injector: ButtonInjector::default(),
            playback: PlaybackOrchestrator::new(speech),
            auto_play: false,
            discovery_task: Mutex::new(None),
        }
    }

    /// Open the store and resolver described by `runtime`.
    pub fn from_runtime(
        runtime: &RuntimeConfig,
        surfaces: Arc<dyn SurfaceFactory>,
        speech: Arc<dyn SpeechEngine>,
    ) -> Result<Self, StoreError> {
        let store = SettingsStore::open(runtime.settings_path())?;
        log::info!("addon: settings at {}", store.path().display());
        let resolver = VoiceResolver::new(surfaces, runtime.discovery_timeout());
        Ok(Self::new(Arc::new(store), resolver, speech).with_auto_play(runtime.auto_play))
    }

    /// Read every speakable field when a card side is rendered.
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    /// Replace the field scanner (custom field locators).
    pub fn with_scanner(mut self, scanner: FieldScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replace the button injector.
    pub fn with_injector(mut self, injector: ButtonInjector) -> Self {
        self.injector = injector;
        self
    }

    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    pub fn playback_status(&self) -> SharedPlayback {
        self.playback.status()
    }

    /// Handle to the latest playback session (auto-play included).
    pub fn current_playback(&self) -> Option<PlaybackHandle> {
        self.playback.current()
    }

    /// Languages and voices the settings GUI should offer: the discovered
    /// catalog once discovery succeeded, the document's own otherwise.
    pub fn voice_catalog(&self) -> VoiceCatalog {
        let discovery = Arc::clone(&*lock(&self.discovery));
        let discovered = discovery.cached().cloned().unwrap_or_default();
        VoiceCatalog::seeded(&self.store.load(), &discovered)
    }

    /// Fields of `note_type_id` whose rule names a language or voice that is
    /// not currently offered, for highlighting in the settings GUI.
    pub fn stale_fields(&self, note_type_id: &str) -> Vec<String> {
        let doc = self.store.load();
        doc.field_settings
            .get(note_type_id)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|(_, rule)| doc.is_stale(rule))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Start background voice discovery. Calling again while a discovery
    /// task is pending does nothing.
    pub fn activate(&self) {
        let mut task = lock(&self.discovery_task);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            log::debug!("addon: discovery already running");
            return;
        }

        let store = Arc::clone(&self.store);
        let discovery = Arc::clone(&*lock(&self.discovery));
        *task = Some(tokio::spawn(async move {
            let catalog = discovery.run_once().await;
            if catalog.is_empty() {
                log::info!("addon: no voices discovered, keeping configured catalog");
                return;
            }
            if let Err(e) = store.update(|doc| merge_catalog(doc, catalog)) {
                log::warn!("addon: could not save discovered voices: {e}");
            }
        }));
        log::info!("addon: activated");
    }

    /// Wait for the discovery task spawned by [`activate`](Self::activate).
    pub async fn discovery_settled(&self) {
        let task = lock(&self.discovery_task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    log::warn!("addon: discovery task failed: {e}");
                }
            }
        }
    }

    /// Augment `card` with TTS buttons, registering any new fields on the
    /// way. Returns the markup to display.
    pub fn on_card_render(&self, card: &RenderedCard) -> String {
        let snapshot = self.store.load();
        if !snapshot.enabled {
            return card.markup.clone();
        }

        let regions = self.scanner.scan(&card.markup, card.side, &card.note_type_id, &snapshot);
        let doc = self.register(card, snapshot);

        let rules = NoteTypeRules::new(&doc, &card.note_type_id);
        if self.auto_play && !regions.is_empty() {
            log::debug!("addon: auto-playing {} region(s)", regions.len());
            self.playback.play(&regions, &rules);
        }
        self.injector.inject(&card.markup, &regions, &rules)
    }

    /// Read `card`'s enabled fields aloud, preempting any current readout.
    pub fn play_card(&self, card: &RenderedCard) -> PlaybackHandle {
        self.play_matching(card, |_| true)
    }

    /// Read only `field_name`'s regions on `card` (one button click),
    /// preempting any current readout.
    pub fn play_field(&self, card: &RenderedCard, field_name: &str) -> PlaybackHandle {
        self.play_matching(card, |region| region.field_name == field_name)
    }

    fn play_matching<F>(&self, card: &RenderedCard, keep: F) -> PlaybackHandle
    where
        F: Fn(&FieldRegion) -> bool,
    {
        let doc = self.store.load();
        let regions: Vec<FieldRegion> = if doc.enabled {
            self.scanner
                .scan(&card.markup, card.side, &card.note_type_id, &doc)
                .into_iter()
                .filter(|region| keep(region))
                .collect()
        } else {
            Vec::new()
        };
        let rules = NoteTypeRules::new(&doc, &card.note_type_id);
        self.playback.play(&regions, &rules)
    }

    pub fn stop(&self) {
        self.playback.stop();
    }

    /// Stop playback and abandon pending discovery. A later
    /// [`activate`](Self::activate) discovers voices afresh.
    pub fn deactivate(&self) {
        self.playback.stop();
        if let Some(task) = lock(&self.discovery_task).take() {
            task.abort();
        }
        let mut discovery = lock(&self.discovery);
        let resolver = discovery.resolver().clone();
        *discovery = Arc::new(VoiceDiscovery::new(resolver));
        log::info!("addon: deactivated");
    }

    /// Register every field present on the card (either side) and prune the
    /// note type when its field list is known. Save failures are logged and
    /// the unsaved snapshot is used for this render.
    fn register(&self, card: &RenderedCard, snapshot: ConfigDocument) -> ConfigDocument {
        let present = self.scanner.locate(&card.markup, CardSide::Front);
        let observed: Vec<ObservedField> = observed_field_names(&present)
            .into_iter()
            .map(|name| ObservedField::new(card.note_type_id.as_str(), name))
            .collect();

        let result = self.store.update(|doc| {
            register_fields(doc, &observed);
            if let Some(fields) = &card.note_fields {
                prune_note_type(doc, &card.note_type_id, fields);
            }
        });
        match result {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("addon: could not save field rules: {e}");
                snapshot
            }
        }
    }
}

impl Drop for TtsAddon {
    fn drop(&mut self) {
        self.playback.stop();
        if let Some(task) = lock(&self.discovery_task).take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
