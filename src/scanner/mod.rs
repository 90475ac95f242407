//! Field scanner — finds the speakable field regions on a rendered card.
//!
//! The host rendering pipeline leaves markers in its output that tie markup
//! back to source fields (by default a `data-field="<name>"` attribute). The
//! scanner never guesses field names from content; a [`FieldLocator`]
//! strategy reads those markers.
//!
//! ```text
//! markup ──parse──▶ DOM (document order walk)
//!                     ├─ FieldLocator hit      → FieldRegion { name, text, position }
//!                     └─ first id="answer"     → marker position
//! Back  side: keep regions after the marker (all, if no marker)
//! Front side: keep everything
//! then drop fields without an enabled FieldRule
//! ```

pub mod locator;
pub mod scan;

pub use locator::{AttributeLocator, FieldLocator, DEFAULT_FIELD_ATTRIBUTE};
pub use scan::{observed_field_names, FieldScanner, ANSWER_MARKER_ID};

/// Which side of the card was rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSide {
    /// Question side.
    Front,
    /// Answer side; usually repeats the front above the answer marker.
    Back,
}

impl CardSide {
    /// Parse a host side indicator (`"front"`, `"question"`, `"back"`, …).
    ///
    /// ```
    /// use tts_field_helper::scanner::CardSide;
    ///
    /// assert_eq!(CardSide::parse("Back"), Some(CardSide::Back));
    /// assert_eq!(CardSide::parse("question"), Some(CardSide::Front));
    /// assert_eq!(CardSide::parse("middle"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "front" | "question" | "q" => Some(Self::Front),
            "back" | "answer" | "a" => Some(Self::Back),
            _ => None,
        }
    }
}

/// One rendered occurrence of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegion {
    /// Source field name as reported by the locator.
    pub field_name: String,
    /// Whitespace-normalised text content; may be empty.
    pub text: String,
    /// Document-order index among all located regions on the card.
    pub position: usize,
}
