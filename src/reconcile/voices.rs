//! Voice catalog merge with the preserve-selection guarantee.

use crate::config::ConfigDocument;
use crate::voices::VoiceCatalog;

/// Fold a discovered catalog into `doc.languages` / `doc.voices`.
///
/// An empty catalog (discovery unavailable) is a no-op. The empty voice name
/// means "platform default" and is always reachable, so it is never appended
/// back.
pub fn merge_catalog(doc: &mut ConfigDocument, discovered: &VoiceCatalog) {
    if discovered.is_empty() {
        return;
    }

    for lang in discovered.languages() {
        if !doc.languages.iter().any(|l| l == lang) {
            log::debug!("reconcile: new language {lang}");
            doc.languages.push(lang.to_string());
        }
    }

    for (lang, found) in discovered.iter() {
        let mut next = found.to_vec();
        let selected = doc
            .field_settings
            .values()
            .flat_map(|fields| fields.values())
            .filter(|rule| rule.lang == lang && !rule.voice.is_empty());
        for rule in selected {
            if !next.contains(&rule.voice) {
                log::debug!(
                    "reconcile: keeping selected voice {:?} for {lang}",
                    rule.voice
                );
                next.push(rule.voice.clone());
            }
        }
        doc.voices.insert(lang.to_string(), next);
    }
}
