//! Builds prompt wildcard files from the training tags embedded in LoRA
//! `.safetensors` headers.

pub mod activation;
pub mod config;
pub mod generator;
pub mod header;
pub mod models;
pub mod output;
pub mod scan;
pub mod tags;

pub use config::{GenerateOptions, OptionsBuilder};
pub use generator::{PromptGenerator, RunSummary};
pub use models::{TagFrequency, TagKind};
