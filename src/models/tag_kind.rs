use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a tag came from inside the model metadata.
///
/// Most tags are captions counted during training. The remaining kinds are
/// synthesized from auxiliary metadata keys and always carry frequency 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// Caption tag counted by the trainer.
    #[default]
    Training,
    /// Entry from `ss_character_tags`.
    Character,
    /// Derived from `ss_dataset_name`.
    Dataset,
    /// Derived from the `network_module` of `ss_network_args`.
    Network,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Character => write!(f, "character"),
            Self::Dataset => write!(f, "dataset"),
            Self::Network => write!(f, "network"),
        }
    }
}
