mod tag_frequency;
mod tag_kind;

pub use tag_frequency::TagFrequency;
pub use tag_kind::TagKind;
