//! Reconciler — folds discovery results and newly seen fields into the
//! settings document without destroying user choices.
//!
//! Guarantees:
//! * discovered languages are appended, existing order untouched;
//! * a discovered voice list replaces the old one, but any voice a rule
//!   still selects is appended back so it stays reachable;
//! * an unseen `(note type, field)` pair gets the default rule exactly once;
//! * rules are only ever deleted by [`prune_note_type`], and only for fields
//!   the note type no longer has.
//!
//! Every function is deterministic, so reconciling twice with the same inputs
//! leaves the document unchanged the second time.

pub mod fields;
pub mod voices;

pub use fields::{prune_note_type, register_fields, ObservedField};
pub use voices::merge_catalog;

use crate::config::ConfigDocument;
use crate::voices::VoiceCatalog;

/// Merge `discovered` voices and `observed` fields into `doc`.
pub fn reconcile(
    mut doc: ConfigDocument,
    discovered: &VoiceCatalog,
    observed: &[ObservedField],
) -> ConfigDocument {
    reconcile_in_place(&mut doc, discovered, observed);
    doc
}

/// In-place form of [`reconcile`], for use inside
/// [`SettingsStore::update`](crate::config::SettingsStore::update).
pub fn reconcile_in_place(
    doc: &mut ConfigDocument,
    discovered: &VoiceCatalog,
    observed: &[ObservedField],
) {
    merge_catalog(doc, discovered);
    register_fields(doc, observed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldRule;
    use crate::voices::PlatformVoice;

    fn discovered() -> VoiceCatalog {
        VoiceCatalog::from_platform_voices(vec![
            PlatformVoice::new("Alex", "en-US"),
            PlatformVoice::new("Samantha", "en-US"),
            PlatformVoice::new("Thomas", "fr-FR"),
        ])
    }

    fn observed() -> Vec<ObservedField> {
        vec![
            ObservedField::new("NT1", "Front"),
            ObservedField::new("NT1", "Back"),
            ObservedField::new("NT2", "Text"),
        ]
    }

    fn customised_doc() -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        doc.set_field_rule("NT1", "Front", FieldRule::new(false, "en-US", "Microsoft Zira"));
        doc
    }

    #[test]
    fn reconcile_is_idempotent() {
        let once = reconcile(customised_doc(), &discovered(), &observed());
        let twice = reconcile(once.clone(), &discovered(), &observed());
        assert_eq!(once, twice);
    }

    #[test]
    fn reconcile_combines_voices_and_fields() {
        let doc = reconcile(customised_doc(), &discovered(), &observed());

        assert_eq!(doc.languages, vec!["en-US", "ja-JP", "fr-FR"]);
        assert_eq!(
            doc.voices["en-US"],
            vec!["Alex", "Samantha", "Microsoft Zira"]
        );
        // Existing choice untouched, new fields get the default rule.
        assert_eq!(
            doc.field_rule("NT1", "Front"),
            Some(&FieldRule::new(false, "en-US", "Microsoft Zira"))
        );
        assert_eq!(
            doc.field_rule("NT1", "Back"),
            Some(&FieldRule::new(true, "en-US", "Alex"))
        );
        assert!(doc.field_rule("NT2", "Text").is_some());
    }

    #[test]
    fn empty_inputs_change_nothing() {
        let doc = customised_doc();
        assert_eq!(reconcile(doc.clone(), &VoiceCatalog::default(), &[]), doc);
    }
}
