//! Field registration and note-type pruning.

use crate::config::ConfigDocument;

/// A `(note type, field)` pair seen on a rendered card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservedField {
    pub note_type_id: String,
    pub field_name: String,
}

impl ObservedField {
    pub fn new(note_type_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            note_type_id: note_type_id.into(),
            field_name: field_name.into(),
        }
    }
}

/// Give every unregistered observed field the default rule.
///
/// Existing rules are never touched. Returns how many rules were inserted.
pub fn register_fields(doc: &mut ConfigDocument, observed: &[ObservedField]) -> usize {
    let mut inserted = 0;
    for field in observed {
        if doc
            .field_rule(&field.note_type_id, &field.field_name)
            .is_some()
        {
            continue;
        }
        let rule = doc.default_rule();
        log::info!(
            "reconcile: registering {}/{} (lang={:?})",
            field.note_type_id,
            field.field_name,
            rule.lang
        );
        doc.set_field_rule(&field.note_type_id, &field.field_name, rule);
        inserted += 1;
    }
    inserted
}

/// Align `note_type_id`'s rules with its current field list.
///
/// Rules for fields that no longer exist are removed; missing fields are
/// registered with the default rule. Returns the number of removed rules.
pub fn prune_note_type<S: AsRef<str>>(
    doc: &mut ConfigDocument,
    note_type_id: &str,
    current_fields: &[S],
) -> usize {
    let mut removed = 0;
    if let Some(rules) = doc.field_settings.get_mut(note_type_id) {
        let before = rules.len();
        rules.retain(|name, _| current_fields.iter().any(|f| f.as_ref() == name));
        removed = before - rules.len();
        if removed > 0 {
            log::info!("reconcile: dropped {removed} rule(s) for removed fields of {note_type_id}");
        }
    }

    let observed: Vec<ObservedField> = current_fields
        .iter()
        .map(|f| ObservedField::new(note_type_id, f.as_ref()))
        .collect();
    register_fields(doc, &observed);
    removed
}
