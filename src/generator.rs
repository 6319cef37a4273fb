use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::activation::activation_text;
use crate::config::GenerateOptions;
use crate::header::{self, HeaderError};
use crate::output;
use crate::scan::find_model_files;
use crate::tags::{Sampler, parse_tags, sort_by_frequency};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    /// Number of model files turned into prompt lines.
    pub files: usize,
    pub elapsed: Duration,
}

/// Builds one wildcard line per model file.
///
/// A metadata problem in one file never aborts the batch: it is logged and
/// the file falls back to activation text or an empty prompt.
///
/// # Examples
///
/// ```no_run
/// use lora_wildcard::{GenerateOptions, PromptGenerator};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut generator = PromptGenerator::new(GenerateOptions::default());
/// let summary = generator.run("models/Lora/style".as_ref())?;
/// println!("wrote {} lines to {}", summary.files, summary.output_path.display());
/// # Ok(())
/// # }
/// ```
pub struct PromptGenerator {
    options: GenerateOptions,
    sampler: Sampler,
    rng: StdRng,
}

impl PromptGenerator {
    /// Creates a generator. A configured seed makes random sampling repeatable.
    pub fn new(options: GenerateOptions) -> Self {
        let sampler = Sampler::new(options.threshold, options.excluded_tags.iter().cloned())
            .with_escape(options.escape);
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            options,
            sampler,
            rng,
        }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Samples a prompt from the tags in the model's header.
    ///
    /// Returns an empty prompt when the header has no metadata.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError` if the header cannot be read.
    pub fn tag_prompt(&mut self, model_path: &Path) -> Result<String, HeaderError> {
        let Some(metadata) = header::read_metadata(model_path)? else {
            tracing::info!(path = %model_path.display(), "metadata not found");
            return Ok(String::new());
        };

        let mut tags = parse_tags(&metadata);
        sort_by_frequency(&mut tags);
        tracing::debug!(path = %model_path.display(), count = tags.len(), "parsed tags");

        Ok(self.sampler.generate_prompt(&tags, &mut self.rng))
    }

    /// Resolves the prompt body for a model, trying the preferred source first
    /// and the other source when the first comes back empty.
    pub fn prompt_for(&mut self, model_path: &Path) -> String {
        if self.options.prefer_activation {
            let prompt = activation_text(model_path);
            if prompt.is_empty() {
                self.tag_prompt_or_empty(model_path)
            } else {
                prompt
            }
        } else {
            let prompt = self.tag_prompt_or_empty(model_path);
            if prompt.is_empty() {
                activation_text(model_path)
            } else {
                prompt
            }
        }
    }

    /// Full wildcard line for a model: `<lora:{stem}:{weight}>,{prompt}`.
    pub fn line_for(&mut self, model_path: &Path) -> String {
        let prompt = self.prompt_for(model_path);
        let stem = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format_line(&stem, self.options.weight, &prompt)
    }

    /// Scans `dir`, writes the wildcard file and reports what was done.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not a directory or the output file cannot
    /// be written. Per-file metadata errors are logged instead.
    pub fn run(&mut self, dir: &Path) -> Result<RunSummary> {
        let started = Instant::now();

        let files = find_model_files(dir)?;
        tracing::info!(dir = %dir.display(), count = files.len(), "found model files");

        let lines: Vec<String> = files.iter().map(|f| self.line_for(f)).collect();

        let timestamp = output::timestamp()?;
        let file_name = output::output_file_name(dir, &timestamp);
        let output_path = match &self.options.output_dir {
            Some(out) => out.join(file_name),
            None => PathBuf::from(file_name),
        };

        output::write_lines(&output_path, &lines)
            .with_context(|| format!("Failed to write wildcard file {}", output_path.display()))?;

        let elapsed = started.elapsed();
        tracing::info!(
            output = %output_path.display(),
            lines = lines.len(),
            "elapsed time : {:.3}s",
            elapsed.as_secs_f64()
        );

        Ok(RunSummary {
            output_path,
            files: lines.len(),
            elapsed,
        })
    }

    fn tag_prompt_or_empty(&mut self, model_path: &Path) -> String {
        self.tag_prompt(model_path).unwrap_or_else(|e| {
            tracing::warn!(path = %model_path.display(), error = %e, "failed to read metadata");
            String::new()
        })
    }
}

/// Formats a wildcard line with the weight rounded to two decimals.
///
/// # Examples
///
/// ```
/// use lora_wildcard::generator::format_line;
///
/// assert_eq!(format_line("ink", 1.0, "ink wash"), "<lora:ink:1.00>,ink wash");
/// assert_eq!(format_line("ink", 0.8, ""), "<lora:ink:0.80>,");
/// ```
pub fn format_line(stem: &str, weight: f64, prompt: &str) -> String {
    format!("<lora:{stem}:{weight:.2}>,{prompt}")
}
