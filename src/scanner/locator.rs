//! Strategies mapping DOM elements back to source field names.

use scraper::node::Element;

/// Attribute the default locator reads.
pub const DEFAULT_FIELD_ATTRIBUTE: &str = "data-field";

/// Host-provided mapping from a rendered element to its source field.
pub trait FieldLocator: Send + Sync {
    /// Field name `element` was rendered from, or `None` for ordinary markup.
    fn field_name(&self, element: &Element) -> Option<String>;
}

/// Reads the field name from an attribute on the wrapping element.
#[derive(Debug, Clone)]
pub struct AttributeLocator {
    attribute: String,
}

impl AttributeLocator {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl Default for AttributeLocator {
    fn default() -> Self {
        Self::new(DEFAULT_FIELD_ATTRIBUTE)
    }
}

impl FieldLocator for AttributeLocator {
    fn field_name(&self, element: &Element) -> Option<String> {
        element
            .attr(&self.attribute)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}
