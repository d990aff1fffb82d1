//! annotator: scan C++ sources for component and routing markers, generate
//! dispatch-table entries and mark the markers as processed.
//!
//! - `annotator src/` runs the full pipeline and prints the generated entries
//! - `annotator -m check src/` only reports which files carry `//@Component`
//! - `annotator -m validate -o results.json src/` reports placement and value checks

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use annotator::config::{resolve_config_path, Config};
use annotator::diagnostics::TracingDiagnostics;
use annotator::discover::{expand_inputs, HeaderIndex};
use annotator::model::RouteRecord;
use annotator::pipeline::{analyze, read_source, Pipeline, PipelineOptions};
use annotator::render::{check_duplicates, create_renderer};
use annotator::report::{self, FileReport, Totals};
use annotator::scanner::locate::has_active_component;
use annotator::validate::ValidationOptions;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Report which files carry an active //@Component
    Check,
    /// Detailed marker, placement and value report
    Validate,
    /// Full pipeline without rewriting markers
    DryRun,
    /// Full pipeline; markers are rewritten
    Process,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Check => "check",
            Mode::Validate => "validate",
            Mode::DryRun => "dry-run",
            Mode::Process => "process",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Cpp,
    Json,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Format::Cpp => "cpp",
            Format::Json => "json",
        }
    }
}

#[derive(Parser)]
#[command(
    name = "annotator",
    about = "Scan C++ sources for component and routing markers and generate dispatch entries"
)]
struct Cli {
    /// Source files, directories or glob patterns
    #[arg(required = true)]
    paths: Vec<String>,

    #[arg(short = 'm', long, value_enum, default_value_t = Mode::Process)]
    mode: Mode,

    /// Fragment format (default from config, else cpp)
    #[arg(short = 'f', long, value_enum)]
    format: Option<Format>,

    /// Write generated entries to this file instead of stdout
    #[arg(short = 'e', long)]
    emit: Option<PathBuf>,

    /// Write a JSON results summary to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print aggregate counts
    #[arg(long)]
    summary: bool,

    /// Only keep files under these directories. Can be given multiple times.
    #[arg(long)]
    include: Vec<String>,

    /// Additional directories to skip. Can be given multiple times.
    #[arg(long)]
    exclude: Vec<String>,

    /// Config file (default: ./annotator.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Require the Component's class to name its base interface
    #[arg(long)]
    strict_inheritance: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(config_path.as_deref()).context("failed to load config")?;

    let mut discover = config.discover_options();
    if !cli.include.is_empty() {
        discover.include = cli.include.clone();
    }
    discover.exclude.extend(cli.exclude.iter().cloned());

    let files = expand_inputs(&cli.paths, &discover)?;
    if files.is_empty() {
        tracing::warn!("no C++ sources found");
    }
    tracing::info!("{} file(s) to analyse", files.len());

    let validation = ValidationOptions {
        strict_inheritance: cli.strict_inheritance || config.strict_inheritance,
    };

    let reports = match cli.mode {
        Mode::Check => check_mode(&files),
        Mode::Validate => validate_mode(&files, validation),
        Mode::DryRun | Mode::Process => {
            let format = cli.format.map(Format::as_str).unwrap_or(config.format.as_str());
            pipeline_mode(&cli, &files, format, validation)?
        }
    };

    if let Some(ref output) = cli.output {
        report::write_summary(output, cli.mode.as_str(), &reports)
            .with_context(|| format!("failed to write summary {}", output.display()))?;
    }

    let totals = Totals::tally(&reports);
    if cli.summary {
        print!("{}", report::render_totals(&totals));
    }

    if totals.failed > 0 {
        bail!("{} of {} file(s) failed", totals.failed, totals.files_analysed);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn check_mode(files: &[PathBuf]) -> Vec<FileReport> {
    let mut reports = Vec::new();
    for path in files {
        match read_source(path) {
            Ok(file) => {
                let found = has_active_component(&file);
                println!("{}", report::render_check(path, found));
                reports.push(FileReport {
                    has_component: found,
                    ..FileReport::empty(path)
                });
            }
            Err(err) => {
                tracing::warn!("{}", err);
                reports.push(FileReport::empty(path));
            }
        }
    }
    reports
}

fn validate_mode(files: &[PathBuf], options: ValidationOptions) -> Vec<FileReport> {
    let mut reports = Vec::new();
    for path in files {
        match read_source(path) {
            Ok(file) => {
                let analysis = analyze(&file, options);
                print!("{}", report::render_validation(path, &analysis));
                reports.push(FileReport::from_analysis(path, &analysis));
            }
            Err(err) => {
                tracing::warn!("{}", err);
                reports.push(FileReport::empty(path));
            }
        }
    }
    reports
}

fn pipeline_mode(
    cli: &Cli,
    files: &[PathBuf],
    format: &str,
    validation: ValidationOptions,
) -> Result<Vec<FileReport>> {
    let renderer = create_renderer(format)?;
    let headers = HeaderIndex::build(files);
    tracing::debug!("header index holds {} header(s)", headers.len());

    let diagnostics = TracingDiagnostics;
    let options = PipelineOptions {
        dry_run: cli.mode == Mode::DryRun,
        validation,
    };
    let pipeline = Pipeline::new(options, &diagnostics, renderer.as_ref()).with_headers(&headers);
    let mut outcomes = pipeline.generate(files);

    let routes: Vec<RouteRecord> = outcomes
        .iter()
        .filter(|o| !o.failed())
        .flat_map(|o| o.routes.iter().cloned())
        .collect();
    if let Err(err) = check_duplicates(&routes) {
        tracing::warn!("across files: {}", err);
    }

    if !routes.is_empty() {
        let text = renderer.render(&routes)?;
        match cli.emit {
            Some(ref emit) => {
                fs::write(emit, &text)
                    .with_context(|| format!("failed to write {}", emit.display()))?;
                tracing::info!("wrote {} route(s) to {}", routes.len(), emit.display());
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .context("failed to write generated entries to stdout")?;
            }
        }
    }

    // Mark only after the entries are written
    if !options.dry_run {
        for outcome in outcomes.iter_mut() {
            pipeline.mark(outcome);
        }
    }

    Ok(outcomes.iter().map(FileReport::from_outcome).collect())
}
