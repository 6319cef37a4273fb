use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use lora_wildcard::config::ConfigError;
use lora_wildcard::scan::ScanError;
use lora_wildcard::{GenerateOptions, OptionsBuilder, PromptGenerator};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Extract tags used for training from lora files and generate wildcards.
/// Omit tags that are used infrequently.
#[derive(Parser, Debug)]
#[command(name = "lora-wildcard")]
#[command(version)]
struct Cli {
    /// Directory scanned recursively for .safetensors files
    #[arg(value_name = "LORA_DIR")]
    lora_dir: PathBuf,

    /// Tag threshold. 0.5 keeps tags used more than half as often as the most
    /// frequent tag. A negative value samples each tag at random, weighted by
    /// frequency. [default: 0.5]
    #[arg(short = 't', long = "th", value_name = "RATIO", allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// LoRA weight written into each line [default: 1.0]
    #[arg(short, long, value_name = "WEIGHT")]
    weight: Option<f64>,

    /// Comma-separated tags never written to a prompt
    /// [default: "simple background, white background"]
    #[arg(short = 'p', long, alias = "prohibited_tags", value_name = "TAGS")]
    prohibited_tags: Option<String>,

    /// Prefer activation text from .json descriptors over training tags
    #[arg(short, long)]
    act: bool,

    /// Escape brackets in tags so they are not read as prompt weights
    #[arg(long)]
    escape: bool,

    /// Seed for random threshold sampling
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Directory for the output file (defaults to the working directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Log per-tag decisions
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options_builder(&self) -> OptionsBuilder {
        let mut builder = OptionsBuilder::new()
            .prefer_activation(self.act)
            .escape(self.escape);

        if let Some(t) = self.threshold {
            builder = builder.threshold(t);
        }
        if let Some(w) = self.weight {
            builder = builder.weight(w);
        }
        if let Some(tags) = &self.prohibited_tags {
            builder = builder.excluded_tags(tags.as_str());
        }
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some(dir) = &self.output_dir {
            builder = builder.output_dir(dir);
        }
        builder
    }
}

fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_informational(e.kind()) => e.exit(),
        Err(e) => {
            // Bad flag values are user errors, the same as bad env values
            let _ = e.print();
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Help and version requests, which clap reports through its error type.
fn is_informational(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the log filter from `RUST_LOG`, defaulting to `info`.
/// `--verbose` raises the global level to `debug` on top of any directives.
fn env_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

/// Determines if an error was caused by the user's input rather than the
/// environment.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.is::<ScanError>() || cause.is::<ConfigError>())
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options_builder().build()?;
    log_options(&options);

    let mut generator = PromptGenerator::new(options);
    let summary = generator
        .run(&cli.lora_dir)
        .with_context(|| format!("Failed to generate wildcards for {}", cli.lora_dir.display()))?;

    println!(
        "Wrote {} prompts to {}",
        summary.files,
        summary.output_path.display()
    );
    Ok(())
}

fn log_options(options: &GenerateOptions) {
    tracing::info!(excluded = ?options.excluded_tags, "prohibited tags");
    tracing::debug!(
        threshold = ?options.threshold,
        weight = options.weight,
        prefer_activation = options.prefer_activation,
        "generation options"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use lora_wildcard::tags::Threshold;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["lora-wildcard"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn directory_is_required() {
        assert!(Cli::try_parse_from(["lora-wildcard"]).is_err());
    }

    #[test]
    fn defaults_leave_options_unset() {
        let cli = parse(&["loras"]);

        assert_eq!(cli.lora_dir, PathBuf::from("loras"));
        assert!(cli.threshold.is_none());
        assert!(cli.weight.is_none());
        assert!(!cli.act);

        let options = cli.options_builder().build_with_env(|_| None).unwrap();
        assert_eq!(options, GenerateOptions::default());
    }

    #[test]
    fn short_flags_parse() {
        let cli = parse(&["loras", "-t", "0.3", "-w", "0.8", "-p", "nsfw, text", "-a"]);
        let options = cli.options_builder().build_with_env(|_| None).unwrap();

        assert_eq!(options.threshold, Threshold::Fixed(0.3));
        assert_eq!(options.weight, 0.8);
        assert_eq!(options.excluded_tags, vec!["nsfw", "text"]);
        assert!(options.prefer_activation);
    }

    #[test]
    fn negative_threshold_selects_random_sampling() {
        let cli = parse(&["loras", "--th", "-1", "--seed", "5"]);
        let options = cli.options_builder().build_with_env(|_| None).unwrap();

        assert_eq!(options.threshold, Threshold::Random);
        assert_eq!(options.seed, Some(5));
    }

    #[test]
    fn underscore_alias_for_prohibited_tags() {
        let cli = parse(&["loras", "--prohibited_tags", "a,b"]);
        assert_eq!(cli.prohibited_tags.as_deref(), Some("a,b"));
    }

    #[test]
    fn bad_flag_value_is_not_informational() {
        let err = Cli::try_parse_from(["lora-wildcard", "loras", "--weight", "heavy"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(!is_informational(err.kind()));
    }

    #[test]
    fn help_and_version_are_informational() {
        let help = Cli::try_parse_from(["lora-wildcard", "--help"]).unwrap_err();
        let version = Cli::try_parse_from(["lora-wildcard", "--version"]).unwrap_err();

        assert!(is_informational(help.kind()));
        assert!(is_informational(version.kind()));
    }

    #[test]
    fn verbose_raises_level_over_rust_log() {
        assert_eq!(
            env_filter(Some("warn"), true).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            env_filter(Some("warn"), false).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn filter_defaults_to_info() {
        assert_eq!(env_filter(None, false).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            env_filter(Some("lora_wildcard=loudest"), false).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn scan_errors_are_user_errors() {
        let err = anyhow::Error::new(ScanError::NotADirectory(PathBuf::from("x")))
            .context("Failed to generate wildcards");
        assert!(is_user_error(&err));
    }

    #[test]
    fn io_errors_are_internal_errors() {
        let err = anyhow::Error::new(std::io::Error::other("disk full"));
        assert!(!is_user_error(&err));
    }
}
