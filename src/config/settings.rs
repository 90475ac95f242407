//! Settings document structs, shipped defaults and lookup helpers.
//!
//! The document is JSON-shaped and edited by both the settings GUI and the
//! reconciler:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "languages": ["en-US", "ja-JP"],
//!   "voices": { "en-US": ["", "Microsoft David"] },
//!   "fieldSettings": { "1684": { "Front": { "enabled": true, "lang": "en-US", "voice": "" } } }
//! }
//! ```
//!
//! Every top-level key is optional on load so documents written by older
//! versions (e.g. without `fieldSettings`) stay readable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language code → ordered candidate voice names.
///
/// The empty voice name means "let the platform pick its default voice".
pub type VoiceMap = BTreeMap<String, Vec<String>>;

/// Note-type id → field name → rule.
pub type FieldSettings = BTreeMap<String, BTreeMap<String, FieldRule>>;

// ---------------------------------------------------------------------------
// FieldRule
// ---------------------------------------------------------------------------

/// Per (note type, field) speech settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    /// Whether this field is read aloud.
    pub enabled: bool,
    /// Language code; expected to be a key of [`ConfigDocument::voices`].
    pub lang: String,
    /// Voice name; empty selects the platform default voice.
    pub voice: String,
}

impl FieldRule {
    /// Build a rule from its parts.
    pub fn new(enabled: bool, lang: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            enabled,
            lang: lang.into(),
            voice: voice.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigDocument
// ---------------------------------------------------------------------------

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Master switch; when `false` no scan happens and no buttons are added.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Candidate languages offered in the GUI, in display order.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Candidate voices per language.
    #[serde(default = "default_voices")]
    pub voices: VoiceMap,
    /// Field rules keyed by note-type id, then field name.
    #[serde(rename = "fieldSettings", default)]
    pub field_settings: FieldSettings,
}

fn default_enabled() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["en-US".into(), "ja-JP".into()]
}

fn default_voices() -> VoiceMap {
    let mut voices = VoiceMap::new();
    voices.insert(
        "en-US".into(),
        vec!["".into(), "Microsoft David".into(), "Microsoft Zira".into()],
    );
    voices.insert(
        "ja-JP".into(),
        vec!["".into(), "Microsoft Haruka".into(), "Microsoft Sayaka".into()],
    );
    voices
}

impl Default for ConfigDocument {
    /// The shipped seed values written on first activation.
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            languages: default_languages(),
            voices: default_voices(),
            field_settings: FieldSettings::new(),
        }
    }
}

impl ConfigDocument {
    /// Look up the rule for `(note_type_id, field_name)`.
    pub fn field_rule(&self, note_type_id: &str, field_name: &str) -> Option<&FieldRule> {
        self.field_settings
            .get(note_type_id)
            .and_then(|fields| fields.get(field_name))
    }

    /// Insert or replace the rule for `(note_type_id, field_name)`.
    pub fn set_field_rule(&mut self, note_type_id: &str, field_name: &str, rule: FieldRule) {
        self.field_settings
            .entry(note_type_id.to_string())
            .or_default()
            .insert(field_name.to_string(), rule);
    }

    /// The rule given to a newly observed field: enabled, first language,
    /// first candidate voice of that language.
    pub fn default_rule(&self) -> FieldRule {
        let lang = self
            .languages
            .first()
            .or_else(|| self.voices.keys().next())
            .cloned()
            .unwrap_or_default();
        let voice = self
            .voices
            .get(&lang)
            .and_then(|list| list.first())
            .cloned()
            .unwrap_or_default();
        FieldRule::new(true, lang, voice)
    }

    /// Language to hand to the speech capability for `rule`.
    ///
    /// A `lang` that is no longer a key of `voices` falls back to the first
    /// configured language; the stored rule itself is left untouched.
    pub fn effective_lang<'a>(&'a self, rule: &'a FieldRule) -> &'a str {
        if self.voices.contains_key(&rule.lang) {
            return &rule.lang;
        }
        self.languages
            .first()
            .map(String::as_str)
            .unwrap_or(rule.lang.as_str())
    }

    /// Voice to hand to the speech capability for `rule`.
    ///
    /// A voice that is not offered for [`effective_lang`](Self::effective_lang)
    /// resolves to `""`, the platform default for that language.
    pub fn effective_voice<'a>(&'a self, rule: &'a FieldRule) -> &'a str {
        let offered = self
            .voices
            .get(self.effective_lang(rule))
            .is_some_and(|list| list.contains(&rule.voice));
        if offered {
            &rule.voice
        } else {
            ""
        }
    }

    /// Returns `true` when `rule` points at a language or voice that is not
    /// currently offered. The GUI shows these as unusual-but-valid.
    pub fn is_stale(&self, rule: &FieldRule) -> bool {
        match self.voices.get(&rule.lang) {
            None => true,
            Some(list) => !rule.voice.is_empty() && !list.contains(&rule.voice),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
