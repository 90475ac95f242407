//! Playback orchestrator — sequences utterances through the speech capability.
//!
//! # Session flow
//!
//! ```text
//! play(regions, rules)
//!   ├─ resolve regions → utterances (rule lang/voice, disabled/unknown skipped)
//!   ├─ cancel previous session's token
//!   └─ spawn session task
//!         ├─ wait until the previous session reported done
//!         └─ for each utterance:
//!               empty text      → next immediately
//!               speak().await   → next on completion signal
//!               speak() error   → warn, next
//!               token cancelled → speech.stop(), Cancelled
//!         └─ Idle, report sent to every PlaybackHandle
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigDocument, FieldRule};
use crate::scanner::FieldRegion;
use crate::speech::{SpeechEngine, Utterance};

use super::state::{new_shared_playback, PlaybackState, SharedPlayback};

// ---------------------------------------------------------------------------
// RuleLookup
// ---------------------------------------------------------------------------

/// Where the orchestrator finds the rule for each region's field.
pub trait RuleLookup {
    /// Rule for `field_name`, if registered.
    fn field_rule(&self, field_name: &str) -> Option<FieldRule>;

    /// Language actually handed to the speech capability for `rule`.
    fn resolve_lang(&self, rule: &FieldRule) -> String {
        rule.lang.clone()
    }

    /// Voice actually handed to the speech capability for `rule`; `""`
    /// selects the platform default.
    fn resolve_voice(&self, rule: &FieldRule) -> String {
        rule.voice.clone()
    }
}

/// Rules of one note type inside a settings document.
pub struct NoteTypeRules<'a> {
    doc: &'a ConfigDocument,
    note_type_id: &'a str,
}

impl<'a> NoteTypeRules<'a> {
    pub fn new(doc: &'a ConfigDocument, note_type_id: &'a str) -> Self {
        Self { doc, note_type_id }
    }
}

impl RuleLookup for NoteTypeRules<'_> {
    fn field_rule(&self, field_name: &str) -> Option<FieldRule> {
        self.doc.field_rule(self.note_type_id, field_name).cloned()
    }

    fn resolve_lang(&self, rule: &FieldRule) -> String {
        self.doc.effective_lang(rule).to_string()
    }

    fn resolve_voice(&self, rule: &FieldRule) -> String {
        self.doc.effective_voice(rule).to_string()
    }
}

// ---------------------------------------------------------------------------
// PlaybackReport / PlaybackHandle
// ---------------------------------------------------------------------------

/// Summary of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Utterances that completed.
    pub spoken: usize,
    /// Utterances whose speech call failed.
    pub failed: usize,
    /// Empty-text regions passed over.
    pub skipped: usize,
    /// Whether the session was stopped before the end of its queue.
    pub cancelled: bool,
}

/// Caller-side handle to one session.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    token: CancellationToken,
    done: watch::Receiver<Option<PlaybackReport>>,
}

impl PlaybackHandle {
    /// Stop this session (no-op once it finished).
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the session reached `Idle`.
    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Wait for the session to end.
    pub async fn finished(mut self) -> PlaybackReport {
        match self.done.wait_for(Option::is_some).await {
            Ok(report) => report.clone().unwrap_or_default(),
            // Session task vanished (runtime shutdown); nothing more will play.
            Err(_) => PlaybackReport {
                cancelled: true,
                ..PlaybackReport::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackOrchestrator
// ---------------------------------------------------------------------------

struct Session {
    token: CancellationToken,
    done: watch::Receiver<Option<PlaybackReport>>,
}

/// Drives sequential readout of a card's fields.
///
/// Must be used from within a tokio runtime.
pub struct PlaybackOrchestrator {
    speech: Arc<dyn SpeechEngine>,
    status: SharedPlayback,
    current: Mutex<Option<Session>>,
}

impl PlaybackOrchestrator {
    pub fn new(speech: Arc<dyn SpeechEngine>) -> Self {
        Self {
            speech,
            status: new_shared_playback(),
            current: Mutex::new(None),
        }
    }

    /// Shared status handle for the host UI.
    pub fn status(&self) -> SharedPlayback {
        Arc::clone(&self.status)
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        lock(&self.status).state.clone()
    }

    /// Start reading `regions` in order, preempting any running session.
    pub fn play(&self, regions: &[FieldRegion], rules: &dyn RuleLookup) -> PlaybackHandle {
        let queue = build_queue(regions, rules);

        let token = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(None);

        let previous = {
            let mut current = lock(&self.current);
            current.replace(Session {
                token: token.clone(),
                done: done_rx.clone(),
            })
        };
        let previous_done = previous.map(|session| {
            log::debug!("playback: preempting running session");
            session.token.cancel();
            session.done
        });

        let session = SessionTask {
            speech: Arc::clone(&self.speech),
            status: Arc::clone(&self.status),
            token: token.clone(),
        };
        tokio::spawn(async move {
            if let Some(mut previous_done) = previous_done {
                // Err only if the previous task is gone, which is also "done".
                let _ = previous_done.wait_for(Option::is_some).await;
            }
            let report = session.run(queue).await;
            let _ = done_tx.send(Some(report));
        });

        PlaybackHandle {
            token,
            done: done_rx,
        }
    }

    /// Stop the running session, if any.
    pub fn stop(&self) {
        if let Some(session) = lock(&self.current).as_ref() {
            session.token.cancel();
        }
    }

    /// Handle to the most recently started session.
    pub fn current(&self) -> Option<PlaybackHandle> {
        lock(&self.current).as_ref().map(|session| PlaybackHandle {
            token: session.token.clone(),
            done: session.done.clone(),
        })
    }
}

impl Drop for PlaybackOrchestrator {
    // Session tasks are detached; without this they would keep speaking.
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolve regions to utterances; fields without an enabled rule are dropped.
fn build_queue(regions: &[FieldRegion], rules: &dyn RuleLookup) -> Vec<Utterance> {
    regions
        .iter()
        .filter_map(|region| {
            let rule = rules.field_rule(&region.field_name)?;
            if !rule.enabled {
                return None;
            }
            Some(Utterance {
                field_name: region.field_name.clone(),
                text: region.text.clone(),
                lang: rules.resolve_lang(&rule),
                voice: rules.resolve_voice(&rule),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SessionTask
// ---------------------------------------------------------------------------

struct SessionTask {
    speech: Arc<dyn SpeechEngine>,
    status: SharedPlayback,
    token: CancellationToken,
}

impl SessionTask {
    async fn run(self, queue: Vec<Utterance>) -> PlaybackReport {
        lock(&self.status).sessions += 1;
        let mut report = PlaybackReport::default();

        for (index, utterance) in queue.iter().enumerate() {
            if self.token.is_cancelled() {
                report.cancelled = true;
                break;
            }

            self.set_state(PlaybackState::Speaking {
                index,
                field_name: utterance.field_name.clone(),
            });

            if utterance.is_silent() {
                report.skipped += 1;
                continue;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.speech.stop();
                    report.cancelled = true;
                    break;
                }
                result = self.speech.speak(utterance) => match result {
                    Ok(()) => report.spoken += 1,
                    Err(e) => {
                        log::warn!("playback: field {:?} failed: {e}", utterance.field_name);
                        lock(&self.status).last_error = Some(e.to_string());
                        report.failed += 1;
                    }
                },
            }
        }

        if report.cancelled {
            log::debug!("playback: session cancelled");
            self.set_state(PlaybackState::Cancelled);
        }
        self.set_state(PlaybackState::Idle);
        report
    }

    fn set_state(&self, state: PlaybackState) {
        lock(&self.status).state = state;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::SpeechError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Records start/end of every utterance. Text `"hold"` never completes;
    /// text `"bad"` fails.
    #[derive(Default)]
    struct ScriptedSpeech {
        events: Mutex<Vec<String>>,
        started: Notify,
        stops: Mutex<usize>,
    }

    impl ScriptedSpeech {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechEngine for ScriptedSpeech {
        async fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", utterance.text));
            self.started.notify_one();

            match utterance.text.as_str() {
                "hold" => std::future::pending::<()>().await,
                "bad" => return Err(SpeechError::Utterance("synth crashed".into())),
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }

            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", utterance.text));
            Ok(())
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn region(field: &str, text: &str, position: usize) -> FieldRegion {
        FieldRegion {
            field_name: field.into(),
            text: text.into(),
            position,
        }
    }

    fn doc_with(fields: &[&str]) -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        for f in fields {
            doc.set_field_rule("NT1", f, FieldRule::new(true, "en-US", "Microsoft Zira"));
        }
        doc
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn speaks_regions_in_order_after_each_completion() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A", "B", "C"]);
        let regions = [region("A", "r1", 0), region("B", "r2", 1), region("C", "r3", 2)];

        let report = orchestrator
            .play(&regions, &NoteTypeRules::new(&doc, "NT1"))
            .finished()
            .await;

        assert_eq!(
            speech.events(),
            vec!["start:r1", "end:r1", "start:r2", "end:r2", "start:r3", "end:r3"]
        );
        assert_eq!(report.spoken, 3);
        assert!(!report.cancelled);
        assert_eq!(orchestrator.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn new_play_cancels_running_session_first() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A", "B", "C"]);
        let rules = NoteTypeRules::new(&doc, "NT1");

        let first = orchestrator.play(&[region("A", "hold", 0), region("B", "never", 1)], &rules);
        speech.started.notified().await;
        assert!(orchestrator.state().is_busy());

        let second = orchestrator.play(&[region("C", "next", 0)], &rules);
        let second_report = second.finished().await;
        let first_report = first.finished().await;

        assert!(first_report.cancelled);
        assert_eq!(first_report.spoken, 0);
        assert_eq!(second_report.spoken, 1);
        assert_eq!(speech.events(), vec!["start:hold", "start:next", "end:next"]);
        assert_eq!(*speech.stops.lock().unwrap(), 1);
        assert_eq!(orchestrator.status().lock().unwrap().sessions, 2);
    }

    #[tokio::test]
    async fn stop_cancels_and_returns_to_idle() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A"]);

        let handle = orchestrator.play(&[region("A", "hold", 0)], &NoteTypeRules::new(&doc, "NT1"));
        speech.started.notified().await;
        orchestrator.stop();

        let report = handle.finished().await;
        assert!(report.cancelled);
        assert_eq!(orchestrator.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn dropping_orchestrator_silences_running_session() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A"]);

        let handle = orchestrator.play(&[region("A", "hold", 0)], &NoteTypeRules::new(&doc, "NT1"));
        speech.started.notified().await;
        drop(orchestrator);

        let report = tokio::time::timeout(Duration::from_secs(1), handle.finished())
            .await
            .expect("session ends after drop");
        assert!(report.cancelled);
        assert_eq!(*speech.stops.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn current_tracks_latest_session() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        assert!(orchestrator.current().is_none());

        let doc = doc_with(&["A"]);
        orchestrator.play(&[region("A", "word", 0)], &NoteTypeRules::new(&doc, "NT1"));
        let report = orchestrator.current().expect("session").finished().await;
        assert_eq!(report.spoken, 1);
    }

    #[tokio::test]
    async fn single_failure_does_not_abort_readout() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A", "B", "C"]);
        let regions = [region("A", "one", 0), region("B", "bad", 1), region("C", "three", 2)];

        let report = orchestrator
            .play(&regions, &NoteTypeRules::new(&doc, "NT1"))
            .finished()
            .await;

        assert_eq!(report.spoken, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(speech.events().last().map(String::as_str), Some("end:three"));
        assert!(orchestrator
            .status()
            .lock()
            .unwrap()
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("synth crashed")));
    }

    #[tokio::test]
    async fn empty_text_is_skipped_without_speaking() {
        let speech = Arc::new(ScriptedSpeech::default());
        let orchestrator = PlaybackOrchestrator::new(speech.clone());
        let doc = doc_with(&["A", "B"]);
        let regions = [region("A", "", 0), region("B", "word", 1)];

        let report = orchestrator
            .play(&regions, &NoteTypeRules::new(&doc, "NT1"))
            .finished()
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(speech.events(), vec!["start:word", "end:word"]);
    }

    #[test]
    fn queue_resolves_voice_and_drops_unconfigured_fields() {
        let mut doc = doc_with(&["A"]);
        doc.set_field_rule("NT1", "B", FieldRule::new(false, "en-US", ""));
        doc.set_field_rule("NT1", "C", FieldRule::new(true, "xx-XX", "Microsoft Haruka"));
        doc.set_field_rule("NT1", "E", FieldRule::new(true, "en-US", "Ghost"));
        let regions = [
            region("A", "a", 0),
            region("B", "b", 1),
            region("C", "c", 2),
            region("D", "d", 3),
            region("E", "e", 4),
        ];

        let queue = build_queue(&regions, &NoteTypeRules::new(&doc, "NT1"));
        let resolved: Vec<(&str, &str, &str)> = queue
            .iter()
            .map(|u| (u.field_name.as_str(), u.lang.as_str(), u.voice.as_str()))
            .collect();
        // Unknown language falls back to the first configured one, and a
        // voice not offered for the spoken language becomes the default.
        assert_eq!(
            resolved,
            vec![
                ("A", "en-US", "Microsoft Zira"),
                ("C", "en-US", ""),
                ("E", "en-US", ""),
            ]
        );
    }
}
