//! zkbench CLI
//!
//! Times witness generation, proof generation and verification of a noir
//! circuit on UltraHonk and UltraPlonk, and prints the mean of each step.
//!
//! ## Usage
//!
//! ```bash
//! # ten interleaved trials per backend against ./circuits
//! zkbench
//!
//! # three UltraHonk trials, JSON output
//! zkbench -n 3 -b ultra_honk --format json
//!
//! # show the effective configuration
//! zkbench --config zkbench.toml config
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zkbench_core::{
    run_benchmark, BackendKind, BbBackendFactory, BenchConfig, CircuitArtifact, CircuitInput,
    FailurePolicy, MonotonicClock, NargoWitnessEngine, TrialRunner,
};

#[derive(Parser, Debug)]
#[command(name = "zkbench")]
#[command(about = "noir proving benchmark for UltraHonk and UltraPlonk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML config file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Trials per backend
    #[arg(short = 'n', long, global = true)]
    iterations: Option<u32>,

    /// Unmeasured trials per backend before the measured ones
    #[arg(long, global = true)]
    warmup: Option<u32>,

    /// Backend to run, repeat for several (ultra_honk, ultra_plonk)
    #[arg(short, long = "backend", global = true, value_parser = parse_backend)]
    backends: Vec<BackendKind>,

    /// abort on the first failed trial, or continue and count failures
    #[arg(long, global = true, value_parser = parse_policy)]
    on_failure: Option<FailurePolicy>,

    /// Noir package directory (Nargo.toml, prover file)
    #[arg(long, global = true)]
    program_dir: Option<PathBuf>,

    /// Compiled circuit artifact
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    /// Prover file stem inside the package
    #[arg(long, global = true)]
    prover_name: Option<String>,

    /// nargo binary
    #[arg(long, global = true, env = "ZKBENCH_NARGO")]
    nargo: Option<PathBuf>,

    /// bb binary
    #[arg(long, global = true, env = "ZKBENCH_BB")]
    bb: Option<PathBuf>,

    /// Report format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Run the benchmark (default)
    Run,
    /// Print the effective configuration as TOML
    Config,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse().map_err(|e: zkbench_core::BenchError| e.to_string())
}

fn parse_policy(s: &str) -> Result<FailurePolicy, String> {
    s.parse().map_err(|e: zkbench_core::BenchError| e.to_string())
}

impl Cli {
    /// config file (or defaults) with command line overrides applied
    fn resolve_config(&self) -> Result<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => BenchConfig::default(),
        };

        if let Some(n) = self.iterations {
            config.iterations = n;
        }
        if let Some(n) = self.warmup {
            config.warmup = n;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.clone();
        }
        if let Some(policy) = self.on_failure {
            config.on_failure = policy;
        }
        if let Some(dir) = &self.program_dir {
            config.program_dir = dir.clone();
        }
        if let Some(artifact) = &self.artifact {
            config.artifact = Some(artifact.clone());
        }
        if let Some(name) = &self.prover_name {
            config.prover_name = name.clone();
        }
        if let Some(nargo) = &self.nargo {
            config.nargo = nargo.clone();
        }
        if let Some(bb) = &self.bb {
            config.bb = bb.clone();
        }

        config.plan().validate().context("invalid benchmark plan")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing, RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("zkbench={0},zkbench_core={0}", level).into()),
        )
        .init();

    let config = cli.resolve_config()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config, cli.format, &mut std::io::stdout().lock()),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run(config: &BenchConfig, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let artifact_path = config.artifact_path();
    let circuit = CircuitArtifact::load(&artifact_path)
        .with_context(|| format!("failed to load circuit {}", artifact_path.display()))?;
    let input = CircuitInput::load(&config.program_dir, &config.prover_name)
        .context("failed to load circuit input")?;
    input.validate(&circuit)?;

    info!("circuit: {} (noir {})", artifact_path.display(), circuit.noir_version);
    info!("input: {}", input.path.display());
    info!(
        "plan: {} iterations, {} warmup, backends {:?}, on failure {:?}",
        config.iterations, config.warmup, config.backends, config.on_failure
    );

    let engine = NargoWitnessEngine::new(&config.nargo, &config.program_dir, &circuit)
        .context("circuit does not match the noir package")?;
    let runner = TrialRunner::new(
        MonotonicClock::new(),
        engine,
        BbBackendFactory::new(&config.bb),
        &circuit,
        &input,
    );
    let report = run_benchmark(&runner, &config.plan())?;

    match format {
        OutputFormat::Text => write!(out, "{}", report)?,
        OutputFormat::Json => writeln!(out, "{}", report.to_json()?)?,
    }
    Ok(())
}
