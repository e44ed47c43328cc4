//! CLI Application logic
//!
//! Contains the command-line interface implementation. Each subcommand is a
//! public `*_command` function that prints its output and returns the value
//! it printed, so the commands can be driven from tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use xliffkit_ast::{Dialect, Document};
use xliffkit_core::{
    convert_document, DialectRegistry, Diagnostic, ErrorSummary, ParseOptions, ParseResult,
    StatePolicy, UserFriendlyReporter, Verdict, XliffError, XliffParser,
};
use xliffkit_validate::{
    AggregatedValidation, ValidationEngine, ValidationResultAggregator, ValidationSettings,
    SETTINGS_FILE,
};

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Versions a document can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConvertTarget {
    #[value(name = "1.2")]
    V12,
    #[value(name = "2.0")]
    V20,
}

impl ConvertTarget {
    pub fn dialect(self) -> Dialect {
        match self {
            ConvertTarget::V12 => Dialect::Xliff12,
            ConvertTarget::V20 => Dialect::Xliff20,
        }
    }
}

#[derive(Parser)]
#[command(name = "xliffkit")]
#[command(author, version, about = "Parse, validate and convert XLIFF files", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dialect of a file
    Detect {
        /// Input XLIFF file
        input: PathBuf,
    },

    /// Parse a file and print its shape and findings
    Parse {
        /// Input XLIFF file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run every validator over a file
    Validate {
        /// Input XLIFF file
        input: PathBuf,

        /// Settings file (defaults to xliffkit.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report unknown translation states as errors
        #[arg(long)]
        strict_states: bool,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Strip vendor extensions and write the baseline dialect
    Normalize {
        /// Input XLIFF file
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a file in another XLIFF version
    Convert {
        /// Input XLIFF file
        input: PathBuf,

        /// Target version
        #[arg(long, value_enum)]
        to: ConvertTarget,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the findings in plain language
    Report {
        /// Input XLIFF file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Detect { input } => {
            detect_command(&input)?;
        }
        Commands::Parse { input, format } => {
            let result = parse_command(&input, format)?;
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Validate {
            input,
            config,
            strict_states,
            format,
        } => {
            let result = validate_command(&input, config.as_deref(), strict_states, format)?;
            if !result.is_valid {
                std::process::exit(1);
            }
        }
        Commands::Normalize { input, output } => {
            normalize_command(&input, output.as_deref())?;
        }
        Commands::Convert { input, to, output } => {
            convert_command(&input, to, output.as_deref())?;
        }
        Commands::Report { input, format } => {
            let summary = report_command(&input, format)?;
            if summary.verdict == Verdict::Fail {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`, `debug` with `-v`)
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when the CLI runs embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the detect command
pub fn detect_command(input: &Path) -> Result<Dialect> {
    let content = read_input(input)?;
    let dialect = DialectRegistry::with_defaults()
        .detect_dialect(&content)
        .ok_or_else(|| unsupported(input))
        .with_context(|| format!("Not a recognized XLIFF file: {}", input.display()))?;
    println!("{} ({})", dialect, dialect.tag());
    Ok(dialect)
}

/// Execute the parse command
pub fn parse_command(input: &Path, format: OutputFormat) -> Result<ParseResult> {
    let content = read_input(input)?;
    let registry = DialectRegistry::with_defaults();
    let parser = create_parser(&registry, &content, input)?;
    let result = parser.parse(&content, &ParseOptions::default());

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize parse result to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if let Some(ref doc) = result.document {
                print_document_summary(input, doc);
            }
            let diagnostics: Vec<&Diagnostic> = result.diagnostics().collect();
            print_diagnostics(input, &diagnostics);
            println!("Parsed in {:.2} ms", result.metadata.parse_time_ms);
        }
    }

    Ok(result)
}

/// Execute the validate command
pub fn validate_command(
    input: &Path,
    config: Option<&Path>,
    strict_states: bool,
    format: OutputFormat,
) -> Result<AggregatedValidation> {
    let mut settings = load_settings(config)?;
    if strict_states {
        settings.states.policy = StatePolicy::Strict;
    }

    let content = read_input(input)?;
    let registry = DialectRegistry::with_state_policy(settings.states.policy);
    let parser = create_parser(&registry, &content, input)?;
    let parsed = parser.parse(&content, &ParseOptions::default());

    // Findings from parsing and validation overlap; merging keeps each once
    let result = match parsed.document {
        Some(ref doc) => {
            let validation = ValidationEngine::from_settings(doc.dialect, &settings).validate(doc);
            let mut merged = ValidationResultAggregator::merge(
                parsed
                    .diagnostics()
                    .cloned()
                    .chain(validation.diagnostics().cloned()),
            );
            merged.summary.by_validator = validation.summary.by_validator;
            merged
        }
        None => ValidationResultAggregator::merge(parsed.diagnostics().cloned()),
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .context("Failed to serialize validation result to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let diagnostics: Vec<&Diagnostic> = result.diagnostics().collect();
            print_diagnostics(input, &diagnostics);
            if result.is_valid {
                println!("{} is valid {}", input.display(), parser.dialect());
            }
        }
    }

    Ok(result)
}

/// Execute the normalize command
///
/// Returns the serialized baseline document.
pub fn normalize_command(input: &Path, output: Option<&Path>) -> Result<String> {
    let content = read_input(input)?;
    let registry = DialectRegistry::with_defaults();
    let parser = create_parser(&registry, &content, input)?;
    let doc = parse_document(parser.as_ref(), &content, input)?;

    let normalized = parser.normalize_document(&doc);
    let writer = registry
        .parser_for(normalized.dialect)
        .with_context(|| format!("No writer registered for {}", normalized.dialect))?;
    let text = writer
        .serialize(&normalized)
        .context("Failed to serialize normalized document")?;

    write_output(output, &text)?;
    Ok(text)
}

/// Execute the convert command
///
/// Returns the serialized converted document.
pub fn convert_command(input: &Path, to: ConvertTarget, output: Option<&Path>) -> Result<String> {
    let content = read_input(input)?;
    let registry = DialectRegistry::with_defaults();
    let parser = create_parser(&registry, &content, input)?;
    let doc = parse_document(parser.as_ref(), &content, input)?;

    let target = to.dialect();
    let converted = convert_document(&doc, target);
    let writer = registry
        .parser_for(target)
        .with_context(|| format!("No writer registered for {}", target))?;
    let text = writer
        .serialize(&converted)
        .with_context(|| format!("Failed to serialize {} document", target))?;

    tracing::debug!(from = %doc.dialect, to = %target, "document converted");
    write_output(output, &text)?;
    Ok(text)
}

/// Execute the report command
pub fn report_command(input: &Path, format: OutputFormat) -> Result<ErrorSummary> {
    let content = read_input(input)?;
    let registry = DialectRegistry::with_defaults();
    let parser = create_parser(&registry, &content, input)?;
    let parsed = parser.parse(&content, &ParseOptions::default());

    let mut diagnostics: Vec<Diagnostic> = parsed.diagnostics().cloned().collect();
    if let Some(ref doc) = parsed.document {
        let validation = ValidationEngine::for_dialect(doc.dialect).validate(doc);
        diagnostics = ValidationResultAggregator::merge(
            diagnostics
                .into_iter()
                .chain(validation.diagnostics().cloned()),
        )
        .diagnostics()
        .cloned()
        .collect();
    }

    let summary = UserFriendlyReporter::new().create_summary(&diagnostics);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize report to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(input, &summary),
    }

    Ok(summary)
}

fn read_input(input: &Path) -> Result<String> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))
}

fn create_parser(
    registry: &DialectRegistry,
    content: &str,
    input: &Path,
) -> Result<Box<dyn XliffParser>> {
    registry
        .create_parser(content)
        .ok_or_else(|| unsupported(input))
        .with_context(|| format!("Not a recognized XLIFF file: {}", input.display()))
}

fn unsupported(input: &Path) -> XliffError {
    XliffError::UnsupportedDialect(input.display().to_string())
}

/// Parse and insist on a document, for commands that rewrite it
fn parse_document(parser: &dyn XliffParser, content: &str, input: &Path) -> Result<Document> {
    let result = parser.parse(content, &ParseOptions::new().with_validation(false));
    match result.document {
        Some(doc) => Ok(doc),
        None => {
            let reason = result
                .errors
                .first()
                .map(|d| d.message.clone())
                .unwrap_or_else(|| "no document produced".to_string());
            anyhow::bail!("Failed to parse {}: {}", input.display(), reason)
        }
    }
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Load validation settings from a file or the working directory
fn load_settings(config_path: Option<&Path>) -> Result<ValidationSettings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            ValidationSettings::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => {
            let candidates = [SETTINGS_FILE.to_string(), format!(".{}", SETTINGS_FILE)];
            for candidate in &candidates {
                let path = Path::new(candidate);
                if path.exists() {
                    return ValidationSettings::load(path)
                        .with_context(|| format!("Failed to load config: {}", path.display()));
                }
            }
            Ok(ValidationSettings::default())
        }
    }
}

fn print_document_summary(input: &Path, doc: &Document) {
    let summary = doc.summary();
    println!("{}: {} (version {})", input.display(), summary.dialect, summary.version);
    println!(
        "  {} file(s), {} group(s), {} segment(s)",
        summary.file_count, summary.group_count, summary.segment_count
    );
    if !summary.source_languages.is_empty() {
        println!(
            "  languages: {} -> {}",
            summary.source_languages.join(", "),
            summary.target_languages.join(", ")
        );
    }
    let stats = summary.word_stats;
    println!(
        "  {} source word(s), {} target word(s), {:.0}% translated",
        stats.source_words,
        stats.target_words,
        stats.completion_percent()
    );
}

fn print_diagnostics(input: &Path, diagnostics: &[&Diagnostic]) {
    if diagnostics.is_empty() {
        println!("✓ No issues found in {}", input.display());
        return;
    }
    for diag in diagnostics {
        println!("{}", diag);
        println!();
    }
    let error_count = diagnostics.iter().filter(|d| d.is_error()).count();
    let warning_count = diagnostics.iter().filter(|d| d.is_warning()).count();
    println!(
        "Found {} error(s) and {} warning(s) in {}",
        error_count,
        warning_count,
        input.display()
    );
}

fn print_report(input: &Path, summary: &ErrorSummary) {
    let verdict = match summary.verdict {
        Verdict::Pass => "PASS",
        Verdict::PassWithWarnings => "PASS (with warnings)",
        Verdict::Fail => "FAIL",
    };
    println!("{}: {}", input.display(), verdict);
    if summary.total == 0 {
        return;
    }

    let counts: Vec<String> = summary
        .by_severity
        .iter()
        .map(|(severity, count)| format!("{} {}", count, severity))
        .collect();
    println!("{} issue(s): {}", summary.total, counts.join(", "));
    println!("Estimated fix time: {} min", summary.estimated_fix_minutes);
    println!();

    for issue in &summary.top_issues {
        println!("[{}] {} ({})", issue.severity, issue.title, issue.code);
        if let Some(ref location) = issue.location {
            println!("  at {}", location);
        }
        println!("  {}", issue.message);
        for suggestion in &issue.suggestions {
            println!("  - {} (~{} min)", suggestion.action, suggestion.estimated_minutes);
        }
        println!();
    }
}
