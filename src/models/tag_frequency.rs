use serde::{Deserialize, Serialize};

use super::TagKind;

/// A tag paired with how often it was observed in the training captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagFrequency {
    tag: String,
    frequency: f64,
    #[serde(default)]
    kind: TagKind,
}

impl TagFrequency {
    /// Creates a training tag with the given frequency.
    ///
    /// # Examples
    ///
    /// ```
    /// use lora_wildcard::{TagFrequency, TagKind};
    ///
    /// let tag = TagFrequency::new("1girl", 42.0);
    /// assert_eq!(tag.tag(), "1girl");
    /// assert_eq!(tag.frequency(), 42.0);
    /// assert_eq!(tag.kind(), TagKind::Training);
    /// ```
    pub fn new(tag: impl Into<String>, frequency: f64) -> Self {
        Self::with_kind(tag, frequency, TagKind::Training)
    }

    /// Creates a tag of a specific kind.
    pub fn with_kind(tag: impl Into<String>, frequency: f64, kind: TagKind) -> Self {
        Self {
            tag: tag.into(),
            frequency,
            kind,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }
}
