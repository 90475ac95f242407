//! Document-order field scan with the answer-marker split.

use std::sync::Arc;

use scraper::{ElementRef, Html};

use crate::config::ConfigDocument;

use super::locator::{AttributeLocator, FieldLocator};
use super::{CardSide, FieldRegion};

/// `id` of the element separating question from answer content.
pub const ANSWER_MARKER_ID: &str = "answer";

/// Scans rendered card markup for field regions.
#[derive(Clone)]
pub struct FieldScanner {
    locator: Arc<dyn FieldLocator>,
}

impl Default for FieldScanner {
    fn default() -> Self {
        Self::new(Arc::new(AttributeLocator::default()))
    }
}

impl FieldScanner {
    pub fn new(locator: Arc<dyn FieldLocator>) -> Self {
        Self { locator }
    }

    /// Structural scan: every eligible region for `side`, in document order.
    ///
    /// On the back side only regions that start after the first answer
    /// marker survive; that covers both descendants of the marker and its
    /// following siblings. A region wrapping the marker starts before it and
    /// is treated as question content. Without a marker nothing is filtered.
    pub fn locate(&self, markup: &str, side: CardSide) -> Vec<FieldRegion> {
        let html = Html::parse_document(markup);

        let mut regions = Vec::new();
        let mut marker_at: Option<usize> = None;

        for (order, node) in html.tree.root().descendants().enumerate() {
            let Some(element) = node.value().as_element() else {
                continue;
            };

            if marker_at.is_none() && element.id() == Some(ANSWER_MARKER_ID) {
                marker_at = Some(order);
            }

            let Some(field_name) = self.locator.field_name(element) else {
                continue;
            };
            let text = ElementRef::wrap(node)
                .map(|el| normalise_text(el.text()))
                .unwrap_or_default();

            regions.push((
                order,
                FieldRegion {
                    field_name,
                    text,
                    position: regions.len(),
                },
            ));
        }

        let keep_after = match (side, marker_at) {
            (CardSide::Front, _) => None,
            (CardSide::Back, None) => {
                log::debug!("scanner: no answer marker on back side, keeping all regions");
                None
            }
            (CardSide::Back, Some(at)) => Some(at),
        };

        regions
            .into_iter()
            .filter(|(order, _)| keep_after.map_or(true, |at| *order > at))
            .map(|(_, region)| region)
            .collect()
    }

    /// Speakable regions: [`locate`](Self::locate) minus fields whose rule is
    /// missing or disabled for `note_type_id`.
    ///
    /// Unregistered fields are skipped rather than read on first sight; the
    /// reconciler registers them for the next render.
    pub fn scan(
        &self,
        markup: &str,
        side: CardSide,
        note_type_id: &str,
        doc: &ConfigDocument,
    ) -> Vec<FieldRegion> {
        self.locate(markup, side)
            .into_iter()
            .filter(|region| {
                doc.field_rule(note_type_id, &region.field_name)
                    .is_some_and(|rule| rule.enabled)
            })
            .collect()
    }
}

/// Distinct field names in first-seen order.
pub fn observed_field_names(regions: &[FieldRegion]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for region in regions {
        if !names.contains(&region.field_name) {
            names.push(region.field_name.clone());
        }
    }
    names
}

fn normalise_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    let joined: String = pieces.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldRule;
    use scraper::node::Element;

    const CARD: &str = r#"
        <div data-field="A">alpha</div>
        <div data-field="B">beta</div>
        <hr id="answer">
        <div data-field="C">gamma</div>
        <div data-field="D">delta</div>
    "#;

    fn names(regions: &[FieldRegion]) -> Vec<&str> {
        regions.iter().map(|r| r.field_name.as_str()).collect()
    }

    fn enabled_doc(fields: &[&str]) -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        for f in fields {
            doc.set_field_rule("NT1", f, FieldRule::new(true, "en-US", ""));
        }
        doc
    }

    #[test]
    fn front_keeps_everything_in_document_order() {
        let regions = FieldScanner::default().locate(CARD, CardSide::Front);
        assert_eq!(names(&regions), vec!["A", "B", "C", "D"]);
        assert_eq!(regions[0].text, "alpha");
        assert_eq!(
            regions.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn back_keeps_regions_after_marker() {
        let regions = FieldScanner::default().locate(CARD, CardSide::Back);
        assert_eq!(names(&regions), vec!["C", "D"]);
        assert_eq!(regions[0].position, 2);
    }

    #[test]
    fn back_keeps_descendants_of_marker() {
        let card = r#"
            <div data-field="Front">q</div>
            <div id="answer"><span data-field="Back">a</span></div>
            <div data-field="Extra">x</div>
        "#;
        let regions = FieldScanner::default().locate(card, CardSide::Back);
        assert_eq!(names(&regions), vec!["Back", "Extra"]);
    }

    #[test]
    fn back_without_marker_keeps_everything() {
        let card = r#"<p data-field="A">a</p><p data-field="B">b</p>"#;
        let regions = FieldScanner::default().locate(card, CardSide::Back);
        assert_eq!(names(&regions), vec!["A", "B"]);
    }

    #[test]
    fn first_marker_is_authoritative() {
        let card = r#"
            <p data-field="A">a</p>
            <hr id="answer">
            <p data-field="B">b</p>
            <hr id="answer">
            <p data-field="C">c</p>
        "#;
        let regions = FieldScanner::default().locate(card, CardSide::Back);
        assert_eq!(names(&regions), vec!["B", "C"]);
    }

    #[test]
    fn region_wrapping_marker_is_front_content() {
        let card = r#"
            <div data-field="Wrapper">q <hr id="answer"> a</div>
            <p data-field="After">z</p>
        "#;
        let regions = FieldScanner::default().locate(card, CardSide::Back);
        assert_eq!(names(&regions), vec!["After"]);
    }

    #[test]
    fn repeated_field_yields_multiple_regions() {
        let card = r#"<b data-field="Word">hi</b> and <i data-field="Word">hi</i>"#;
        let regions = FieldScanner::default().locate(card, CardSide::Front);
        assert_eq!(names(&regions), vec!["Word", "Word"]);
        assert_eq!(observed_field_names(&regions), vec!["Word"]);
    }

    #[test]
    fn empty_field_region_is_kept() {
        let card = r#"<div data-field="Blank"></div><div data-field="Full">x</div>"#;
        let regions = FieldScanner::default().locate(card, CardSide::Front);
        assert_eq!(names(&regions), vec!["Blank", "Full"]);
        assert_eq!(regions[0].text, "");
    }

    #[test]
    fn text_whitespace_is_normalised() {
        let card = "<div data-field=\"A\">  one\n  <b>two</b>\tthree </div>";
        let regions = FieldScanner::default().locate(card, CardSide::Front);
        assert_eq!(regions[0].text, "one two three");
    }

    #[test]
    fn scan_excludes_disabled_and_unregistered_fields() {
        let mut doc = enabled_doc(&["A", "B", "C"]);
        doc.set_field_rule("NT1", "B", FieldRule::new(false, "en-US", ""));

        let scanner = FieldScanner::default();
        assert_eq!(
            names(&scanner.scan(CARD, CardSide::Front, "NT1", &doc)),
            vec!["A", "C"]
        );
        assert_eq!(names(&scanner.scan(CARD, CardSide::Back, "NT1", &doc)), vec!["C"]);
        assert!(scanner.scan(CARD, CardSide::Front, "other", &doc).is_empty());
    }

    struct ClassLocator;

    impl FieldLocator for ClassLocator {
        fn field_name(&self, element: &Element) -> Option<String> {
            element
                .classes()
                .find_map(|c| c.strip_prefix("field-"))
                .map(str::to_string)
        }
    }

    #[test]
    fn custom_locator_is_used() {
        let card = r#"<span class="big field-Kanji">字</span><span class="field-Reading">じ</span>"#;
        let scanner = FieldScanner::new(Arc::new(ClassLocator));
        let regions = scanner.locate(card, CardSide::Front);
        assert_eq!(names(&regions), vec!["Kanji", "Reading"]);
        assert_eq!(regions[0].text, "字");
    }
}
