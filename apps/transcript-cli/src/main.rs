//! Transcript search CLI
//!
//! Entry point for term searches and speaker-relation counts over a
//! directory of council meeting transcripts.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shared_types::{AnalysisReport, RelationCounts};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transcript_engine::dates::parse_date;
use transcript_engine::export::{write_relations, write_report};
use transcript_engine::{
    ContextPolicy, EngineConfig, ExportFormat, MatchMode, TallyGrouping, TranscriptEngine,
    UndatedPolicy,
};

/// Relations printed to stdout; the export always holds the full table
const TOP_RELATIONS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "transcript-cli")]
#[command(
    version,
    about = "Term search and speaker relations over council meeting transcripts"
)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging; ignored when RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count occurrences of a term and collect context snippets
    Search(SearchArgs),
    /// Count consecutive-speaker pairs
    Relations(RelationsArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Term to look for; separate alternatives with '/'
    query: String,

    /// Corpus directory
    #[arg(long)]
    dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[arg(long, value_enum)]
    context: Option<ContextArg>,

    /// Context radius, in words or characters depending on --context
    #[arg(long)]
    radius: Option<usize>,

    #[arg(long, value_enum)]
    group: Option<GroupArg>,

    /// First session date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Last session date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Leave out documents without a date when a range is given
    #[arg(long)]
    exclude_undated: bool,

    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct RelationsArgs {
    /// Corpus directory
    #[arg(long)]
    dir: Option<PathBuf>,

    #[arg(long)]
    parallel: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Export file
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    WholeWord,
    Substring,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContextArg {
    Word,
    Char,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupArg {
    Auto,
    Document,
    Year,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<ModeArg> for MatchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::WholeWord => MatchMode::WholeWord,
            ModeArg::Substring => MatchMode::Substring,
        }
    }
}

impl From<GroupArg> for TallyGrouping {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Auto => TallyGrouping::Auto,
            GroupArg::Document => TallyGrouping::Document,
            GroupArg::Year => TallyGrouping::Year,
        }
    }
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Results go to stdout, logs to stderr
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(env.as_deref(), cli.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing::debug!("Starting transcript-cli v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Search(args) => run_search(&mut config, args),
        Command::Relations(args) => run_relations(&mut config, args),
    }
}

/// `RUST_LOG` when set and valid, else info (debug with `--verbose`)
fn log_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

fn apply_search_args(config: &mut EngineConfig, args: &SearchArgs) -> Result<()> {
    if let Some(dir) = &args.dir {
        config.corpus.directory = dir.clone();
    }

    let search = &mut config.search;
    if let Some(mode) = args.mode {
        search.mode = mode.into();
    }
    if let Some(context) = args.context {
        search.context = match context {
            ContextArg::Word => ContextPolicy::word_window(),
            ContextArg::Char => ContextPolicy::char_window(),
        };
    }
    if let Some(radius) = args.radius {
        search.context = search.context.with_radius(radius);
    }
    if let Some(group) = args.group {
        search.grouping = group.into();
    }
    if let Some(from) = &args.from {
        search.date_from = Some(parse_date(from).context("Invalid --from date")?);
    }
    if let Some(to) = &args.to {
        search.date_to = Some(parse_date(to).context("Invalid --to date")?);
    }
    if args.exclude_undated {
        search.undated = UndatedPolicy::Exclude;
    }
    search.parallel |= args.parallel;

    if let Some(format) = args.output.format {
        config.output.format = format.into();
    }
    Ok(())
}

fn run_search(config: &mut EngineConfig, args: SearchArgs) -> Result<()> {
    apply_search_args(config, &args)?;
    let engine = TranscriptEngine::new(config.clone());

    let documents = engine.load_corpus().with_context(|| {
        format!(
            "Failed to load corpus from {}",
            engine.config().corpus.directory.display()
        )
    })?;
    let report = engine.search(&documents, &args.query)?;

    print_report(&report);

    let format = engine.config().output.format;
    if let Some(path) = output_path(&args.output, engine.config(), "occurrences") {
        let writer = create_output(&path)?;
        write_report(&report, format, writer)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), records = report.records.len(), "Records written");
    }
    Ok(())
}

fn run_relations(config: &mut EngineConfig, args: RelationsArgs) -> Result<()> {
    if let Some(dir) = &args.dir {
        config.corpus.directory = dir.clone();
    }
    config.relations.parallel |= args.parallel;
    if let Some(format) = args.output.format {
        config.output.format = format.into();
    }
    let engine = TranscriptEngine::new(config.clone());

    let documents = engine.load_corpus().with_context(|| {
        format!(
            "Failed to load corpus from {}",
            engine.config().corpus.directory.display()
        )
    })?;
    let counts = engine.count_relations(&documents);

    print_relations(&counts);

    let format = engine.config().output.format;
    if let Some(path) = output_path(&args.output, engine.config(), "relations") {
        let writer = create_output(&path)?;
        write_relations(&counts, format, writer)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), pairs = counts.len(), "Relations written");
    }
    Ok(())
}

/// Explicit `--output`, else `<output.directory>/<stem>.<ext>` from the config
fn output_path(args: &OutputArgs, config: &EngineConfig, stem: &str) -> Option<PathBuf> {
    args.output
        .clone()
        .or_else(|| config.output.path_for(stem))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn print_report(report: &AnalysisReport) {
    if !report.has_occurrences() {
        println!("No occurrences found.");
        return;
    }
    for (key, count) in report.tally.iter() {
        println!("{}\t{}", key.as_str(), count);
    }
    println!(
        "{} occurrences, {} records, {} documents scanned, {} skipped",
        report.total_matches,
        report.records.len(),
        report.documents_scanned,
        report.documents_skipped
    );
}

fn print_relations(counts: &RelationCounts) {
    if counts.is_empty() {
        println!("No relations found.");
        return;
    }
    for row in counts.rows().into_iter().take(TOP_RELATIONS) {
        println!("{}\t{}\t{}", row.speaker_1, row.speaker_2, row.count);
    }
    println!("{} distinct pairs, {} in total", counts.len(), counts.total());
}
