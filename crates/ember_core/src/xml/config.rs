//! Parser settings.

use serde::{Deserialize, Serialize};

/// How a header that repeats an attribute key is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAttributes {
    /// The last occurrence replaces earlier ones.
    #[default]
    LastWins,
    /// The first occurrence is kept, later ones are ignored.
    FirstWins,
    /// A repeated key is a structural error.
    Reject,
}

/// Settings for [`XmlParser`](super::XmlParser).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum node nesting depth; the root is depth 0.
    pub max_depth: usize,

    pub duplicate_attributes: DuplicateAttributes,
}

impl ParserConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_duplicate_attributes(mut self, policy: DuplicateAttributes) -> Self {
        self.duplicate_attributes = policy;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            duplicate_attributes: DuplicateAttributes::default(),
        }
    }
}
