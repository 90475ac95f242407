//! Button injection — appends TTS controls to rendered card markup.
//!
//! The card template is never modified; the buttons are appended after the
//! rendered markup in a container the host's click handler recognises:
//!
//! ```html
//! <div class="tts-auto-helper-container">
//!   <button class="tts-auto-helper-btn" data-tts-text="…" data-tts-lang="en-US" data-tts-voice="">🔊 Front</button>
//! </div>
//! ```
//!
//! Buttons follow region order, which is the order the user sees the fields.

pub mod escape;

pub use escape::escape_attr;

use crate::playback::RuleLookup;
use crate::scanner::FieldRegion;

/// Class of the wrapping container.
pub const CONTAINER_CLASS: &str = "tts-auto-helper-container";
/// Class of each speak button.
pub const BUTTON_CLASS: &str = "tts-auto-helper-btn";

// ---------------------------------------------------------------------------
// ButtonInjector
// ---------------------------------------------------------------------------

/// Configurable button injector.
///
/// For most callers the free function [`inject_buttons`] is sufficient.
#[derive(Debug, Clone)]
pub struct ButtonInjector {
    /// Class of the wrapping `<div>`.
    pub container_class: String,
    /// Class of every `<button>`.
    pub button_class: String,
    /// Text placed before the field name on each button.
    pub label_prefix: String,
}

impl Default for ButtonInjector {
    fn default() -> Self {
        Self {
            container_class: CONTAINER_CLASS.into(),
            button_class: BUTTON_CLASS.into(),
            label_prefix: "🔊 ".into(),
        }
    }
}

impl ButtonInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one button per speakable region. Empty-text regions and
    /// fields without an enabled rule get no button.
    pub fn render_buttons(&self, regions: &[FieldRegion], rules: &dyn RuleLookup) -> Vec<String> {
        regions
            .iter()
            .filter(|region| !region.text.trim().is_empty())
            .filter_map(|region| {
                let rule = rules.field_rule(&region.field_name)?;
                if !rule.enabled {
                    return None;
                }
                let lang = rules.resolve_lang(&rule);
                let voice = rules.resolve_voice(&rule);
                Some(format!(
                    "<button class=\"{}\" data-tts-text=\"{}\" data-tts-lang=\"{}\" data-tts-voice=\"{}\">{}{}</button>",
                    escape_attr(&self.button_class),
                    escape_attr(&region.text),
                    escape_attr(&lang),
                    escape_attr(&voice),
                    escape_attr(&self.label_prefix),
                    escape_attr(&region.field_name),
                ))
            })
            .collect()
    }

    /// Append the button container to `markup`; returns `markup` unchanged
    /// when there is nothing to speak.
    pub fn inject(&self, markup: &str, regions: &[FieldRegion], rules: &dyn RuleLookup) -> String {
        let buttons = self.render_buttons(regions, rules);
        if buttons.is_empty() {
            return markup.to_string();
        }
        format!(
            "{markup}<div class=\"{}\">{}</div>",
            escape_attr(&self.container_class),
            buttons.concat()
        )
    }
}

/// Append TTS buttons for `regions` to `markup` with the default classes.
pub fn inject_buttons(markup: &str, regions: &[FieldRegion], rules: &dyn RuleLookup) -> String {
    ButtonInjector::default().inject(markup, regions, rules)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
