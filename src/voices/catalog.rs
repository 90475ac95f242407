//! Voice catalog normalisation.

use serde::Deserialize;

use crate::config::{ConfigDocument, VoiceMap};

use super::VoiceError;

/// Prefix of the bridge message carrying the enumerated voices.
pub const BRIDGE_PREFIX: &str = "voices:";

/// One voice as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformVoice {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lang: String,
}

impl PlatformVoice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Language → ordered voice names, languages sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: VoiceMap,
}

impl VoiceCatalog {
    /// Group platform voices by language.
    ///
    /// Voices without a language are dropped, as are empty names. Duplicate
    /// names within a language keep their first position.
    pub fn from_platform_voices<I>(voices: I) -> Self
    where
        I: IntoIterator<Item = PlatformVoice>,
    {
        let mut map = VoiceMap::new();
        for voice in voices {
            if voice.lang.is_empty() {
                continue;
            }
            let names = map.entry(voice.lang).or_default();
            if !voice.name.is_empty() && !names.contains(&voice.name) {
                names.push(voice.name);
            }
        }
        Self { voices: map }
    }

    /// Parse the JSON array that follows [`BRIDGE_PREFIX`].
    pub fn from_bridge_payload(payload: &str) -> Result<Self, VoiceError> {
        let voices: Vec<PlatformVoice> = serde_json::from_str(payload)?;
        Ok(Self::from_platform_voices(voices))
    }

    /// Catalog the GUI should offer: `discovered` when auto-detection worked,
    /// otherwise the document's own candidates.
    pub fn seeded(doc: &ConfigDocument, discovered: &VoiceCatalog) -> Self {
        if discovered.is_empty() {
            Self {
                voices: doc.voices.clone(),
            }
        } else {
            discovered.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Discovered languages in sorted order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    /// Voice names for `lang`, if that language was discovered.
    pub fn voices(&self, lang: &str) -> Option<&[String]> {
        self.voices.get(lang).map(Vec::as_slice)
    }

    /// `(language, voices)` pairs in language order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.voices.iter().map(|(l, v)| (l.as_str(), v.as_slice()))
    }

    pub fn as_map(&self) -> &VoiceMap {
        &self.voices
    }
}

impl From<VoiceMap> for VoiceCatalog {
    fn from(voices: VoiceMap) -> Self {
        Self { voices }
    }
}
