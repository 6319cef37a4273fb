//! Generation options and their resolution from flags and environment.

use std::path::PathBuf;

use thiserror::Error;

use crate::tags::{TagNormalizer, Threshold};

/// Tags excluded unless configured otherwise.
pub const DEFAULT_EXCLUDED_TAGS: &str = "simple background, white background";
pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_WEIGHT: f64 = 1.0;

pub const ENV_THRESHOLD: &str = "LORA_WILDCARD_THRESHOLD";
pub const ENV_WEIGHT: &str = "LORA_WILDCARD_WEIGHT";
pub const ENV_EXCLUDE: &str = "LORA_WILDCARD_EXCLUDE";
pub const ENV_OUTPUT_DIR: &str = "LORA_WILDCARD_OUTPUT_DIR";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidNumber { name: String, value: String },
}

/// Options controlling how prompts are generated for a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub threshold: Threshold,
    /// LoRA strength written into each `<lora:...>` prefix.
    pub weight: f64,
    pub excluded_tags: Vec<String>,
    /// Use sidecar activation text first and derived tags as the fallback.
    pub prefer_activation: bool,
    pub escape: bool,
    pub seed: Option<u64>,
    /// Directory for the output file. `None` means the working directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            threshold: Threshold::from_ratio(DEFAULT_THRESHOLD),
            weight: DEFAULT_WEIGHT,
            excluded_tags: parse_tag_list(DEFAULT_EXCLUDED_TAGS),
            prefer_activation: false,
            escape: false,
            seed: None,
            output_dir: None,
        }
    }
}

/// Parses a comma-separated tag list.
///
/// # Examples
///
/// ```
/// use lora_wildcard::config::parse_tag_list;
///
/// assert_eq!(
///     parse_tag_list("simple background, white background,"),
///     vec!["simple background", "white background"]
/// );
/// ```
pub fn parse_tag_list(input: &str) -> Vec<String> {
    TagNormalizer::normalize_tags(input.split(',').map(String::from).collect())
}

/// Builder for `GenerateOptions`.
///
/// Values set on the builder win, then environment variables, then defaults.
///
/// # Examples
///
/// ```
/// use lora_wildcard::config::OptionsBuilder;
/// use lora_wildcard::tags::Threshold;
///
/// let options = OptionsBuilder::new()
///     .threshold(-1.0)
///     .weight(0.8)
///     .build_with_env(|_| None)
///     .unwrap();
///
/// assert_eq!(options.threshold, Threshold::Random);
/// assert_eq!(options.weight, 0.8);
/// ```
#[derive(Debug, Default)]
pub struct OptionsBuilder {
    threshold: Option<f64>,
    weight: Option<f64>,
    excluded_tags: Option<String>,
    prefer_activation: bool,
    escape: bool,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the threshold ratio. Negative values select random sampling.
    pub fn threshold(mut self, ratio: f64) -> Self {
        self.threshold = Some(ratio);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Sets the comma-separated exclusion list.
    pub fn excluded_tags(mut self, tags: impl Into<String>) -> Self {
        self.excluded_tags = Some(tags.into());
        self
    }

    pub fn prefer_activation(mut self, prefer: bool) -> Self {
        self.prefer_activation = prefer;
        self
    }

    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Builds options, reading unset values from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric value is not a finite number.
    pub fn build(self) -> Result<GenerateOptions, ConfigError> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    /// Builds options, reading unset values through `env`.
    pub fn build_with_env<F>(self, env: F) -> Result<GenerateOptions, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let threshold = match self.threshold {
            Some(t) => finite("--th", t)?,
            None => env_number(&env, ENV_THRESHOLD)?.unwrap_or(DEFAULT_THRESHOLD),
        };

        let weight = match self.weight {
            Some(w) => finite("--weight", w)?,
            None => env_number(&env, ENV_WEIGHT)?.unwrap_or(DEFAULT_WEIGHT),
        };

        let excluded = self
            .excluded_tags
            .or_else(|| env(ENV_EXCLUDE))
            .unwrap_or_else(|| DEFAULT_EXCLUDED_TAGS.to_string());

        let output_dir = self
            .output_dir
            .or_else(|| env(ENV_OUTPUT_DIR).filter(|d| !d.trim().is_empty()).map(PathBuf::from));

        Ok(GenerateOptions {
            threshold: Threshold::from_ratio(threshold),
            weight,
            excluded_tags: parse_tag_list(&excluded),
            prefer_activation: self.prefer_activation,
            escape: self.escape,
            seed: self.seed,
            output_dir,
        })
    }
}

fn finite(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidNumber {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

fn env_number<F>(env: &F, name: &str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env(name) else {
        return Ok(None);
    };

    let invalid = || ConfigError::InvalidNumber {
        name: name.to_string(),
        value: raw.clone(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(invalid())
    }
}
