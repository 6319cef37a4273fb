//! Tag extraction and prompt synthesis.
//!
//! Turns the string metadata of a model header into a frequency-ordered tag
//! list, then samples that list into a comma-separated prompt.
//!
//! # Examples
//!
//! ```
//! use lora_wildcard::header::Metadata;
//! use lora_wildcard::tags::{Sampler, Threshold, parse_tags, sort_by_frequency};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut metadata = Metadata::new();
//! metadata.insert(
//!     "ss_tag_frequency".to_string(),
//!     r#"{"10_cat": {"cat": 10, "grass": 6, "blurry": 1}}"#.to_string(),
//! );
//!
//! let mut tags = parse_tags(&metadata);
//! sort_by_frequency(&mut tags);
//!
//! let sampler = Sampler::new(Threshold::Fixed(0.5), Vec::<String>::new());
//! let mut rng = StdRng::seed_from_u64(7);
//! assert_eq!(sampler.generate_prompt(&tags, &mut rng), "cat, grass");
//! ```

mod normalizer;
mod parser;
mod sampler;

pub use normalizer::TagNormalizer;
pub use parser::{TAG_FREQUENCY_KEYS, parse_tags, sort_by_frequency};
pub use sampler::{Sampler, Threshold};
