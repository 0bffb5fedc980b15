//! polyvar - plan seeded builds of polymorphic sources
//!
//! Computes the build variants of one or more batches and prints the
//! compiler invocations that produce them:
//! - `plan` renders every batch of a manifest
//! - `batch` renders one batch described on the command line
//! - `preview` shows the values a seed bakes into a build
//! - `default-seed` shows the seed a build derives from its timestamp

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use poly_seed::{PolyStream, RngSource, SeedSource};
use poly_variant::{BatchSpec, DEFAULT_EXTENSION, Seed, SeedMode};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod command;
mod manifest;
mod plan;
mod render;

use manifest::{DEFAULT_FLAGS, ManifestSource, TomlFile, Toolchain};
use render::{JsonWriter, PlanWriter, ShellWriter};

/// polyvar CLI
#[derive(Parser)]
#[command(name = "polyvar")]
#[command(about = "Plan seeded compiler invocations for polymorphic builds", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, env = "POLYVAR_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "POLYVAR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan every batch of a manifest
    Plan(PlanArgs),
    /// Plan a single batch
    Batch(BatchArgs),
    /// Print the values a seed produces
    Preview(PreviewArgs),
    /// Print the seed a build derives from its timestamp
    DefaultSeed(DefaultSeedArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Shell)]
    format: Format,

    /// Replay seed for random batches; OS entropy when omitted
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[derive(Args)]
struct PlanArgs {
    /// Manifest path
    #[arg(short, long, env = "POLYVAR_CONFIG", default_value = "polyvar.toml")]
    config: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// Seed policy: none, fixed or random
    #[arg(long)]
    mode: SeedMode,

    /// Number of builds
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    count: i64,

    /// Artifact name stem
    #[arg(long)]
    prefix: String,

    /// Source file to compile
    #[arg(long)]
    source: PathBuf,

    /// Artifact directory
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Artifact extension
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Seed for fixed mode, e.g. 1234567890ull
    #[arg(long)]
    fixed_seed: Option<Seed>,

    /// Compiler executable
    #[arg(long, default_value = "g++")]
    compiler: String,

    /// Compiler flag, repeatable; replaces the default flags
    #[arg(long = "flag", allow_hyphen_values = true)]
    flags: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct PreviewArgs {
    /// Seed to evaluate, e.g. 1234567890ull
    #[arg(long)]
    seed: Seed,

    /// Number of values
    #[arg(long, default_value_t = 8)]
    count: u64,

    /// First counter value
    #[arg(long, default_value_t = 0)]
    counter: u64,

    /// Value type to draw, named after the poly_* macro
    #[arg(long, value_enum, default_value_t = Kind::Uint)]
    kind: Kind,

    /// Reduce each uint modulo this bound, like poly_random
    #[arg(long, conflicts_with = "kind")]
    modulus: Option<u32>,

    /// Standard deviation for --kind normal
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    sigma: f64,

    /// Mean for --kind normal
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    mu: f64,
}

#[derive(Args)]
struct DefaultSeedArgs {
    /// Build date in __DATE__ form, e.g. "Oct 16 2026"
    #[arg(long, requires = "time")]
    date: Option<String>,

    /// Build time in __TIME__ form, e.g. "12:34:56"
    #[arg(long, requires = "date")]
    time: Option<String>,

    /// Print the macro literal instead of the decimal value
    #[arg(long)]
    literal: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One command per line
    Shell,
    /// An executable sh script
    Script,
    /// One JSON object per line
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    /// poly_uint(): one counter
    Uint,
    /// poly_int(): one counter
    Int,
    /// poly_ull(): two counters
    Ull,
    /// poly_ll(): two counters
    Ll,
    /// poly_float(), in [0, 1]: one counter
    Float,
    /// poly_double(), in [0, 1]: two counters
    Double,
    /// poly_normal(sigma, mu): four counters
    Normal,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Plan(args) => run_plan(args),
        Command::Batch(args) => run_batch(args),
        Command::Preview(args) => run_preview(args),
        Command::DefaultSeed(args) => run_default_seed(args),
    }
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let source = TomlFile::new(&args.config);
    let manifest = source.load()?;
    if manifest.batches.is_empty() {
        tracing::warn!(path = %source.path().display(), "manifest has no batches");
    }
    emit(&manifest.toolchain, &manifest.batch_specs(), &args.output)
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let flags = if args.flags.is_empty() {
        DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect()
    } else {
        args.flags
    };
    let toolchain = Toolchain {
        compiler: args.compiler,
        flags,
        output_dir: args.out_dir.clone(),
        extension: args.extension.clone(),
    };

    let mut spec = BatchSpec::new(args.count, args.mode, args.prefix, args.source, args.out_dir)
        .with_extension(args.extension);
    spec.fixed_seed = args.fixed_seed;

    emit(&toolchain, &[spec], &args.output)
}

fn emit(toolchain: &Toolchain, batches: &[BatchSpec], output: &OutputArgs) -> Result<()> {
    let mut source: Box<dyn SeedSource> = match output.rng_seed {
        Some(replay) => {
            tracing::debug!(replay, "using replayable seed source");
            Box::new(RngSource::seeded(replay))
        },
        None => Box::new(RngSource::entropy()),
    };

    let stdout = io::stdout().lock();
    let mut writer: Box<dyn PlanWriter> = match output.format {
        Format::Shell => Box::new(ShellWriter::lines(stdout)),
        Format::Script => Box::new(ShellWriter::script(stdout)),
        Format::Json => Box::new(JsonWriter::new(stdout)),
    };

    let written = plan::write_plan(toolchain, batches, source.as_mut(), writer.as_mut())?;
    tracing::info!(variants = written, batches = batches.len(), "plan written");
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    let mut stream = PolyStream::starting_at(args.seed, args.counter);
    for _ in 0..args.count {
        let counter = stream.counter();
        let value = match (args.modulus, args.kind) {
            (Some(max), _) => stream.random(max)?.to_string(),
            (None, Kind::Uint) => stream.uint().to_string(),
            (None, Kind::Int) => stream.int().to_string(),
            (None, Kind::Ull) => stream.ull().to_string(),
            (None, Kind::Ll) => stream.ll().to_string(),
            (None, Kind::Float) => stream.float().to_string(),
            (None, Kind::Double) => stream.double().to_string(),
            (None, Kind::Normal) => stream.normal(args.sigma, args.mu).to_string(),
        };
        println!("{counter}\t{value}");
    }
    Ok(())
}

fn run_default_seed(args: DefaultSeedArgs) -> Result<()> {
    let seed = match (args.date, args.time) {
        (Some(date), Some(time)) => poly_seed::default_seed(&date, &time)?,
        _ => {
            let now = chrono::Local::now().naive_local();
            poly_seed::default_seed_at(now).context("deriving seed from the current time")?
        },
    };

    if args.literal {
        println!("{}", seed.to_literal());
    } else {
        println!("{seed}");
    }
    Ok(())
}
