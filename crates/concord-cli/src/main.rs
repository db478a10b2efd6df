mod batch_cmd;
mod check_cmd;
mod config;
mod extract_cmd;
mod io;
mod repair_cmd;
mod validate_cmd;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use concord_core::policy::{ClinicPlacement, CoverageAveraging};

use config::{PolicyOverrides, ResolvedConfig};

/// Exit status for a plan that is (or stays) misaligned.
const EXIT_MISALIGNED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "concord",
    about = "Check and repair engagement plans against clinical protocols"
)]
struct Cli {
    /// Overall coverage averaging: unweighted or count_weighted
    /// (overrides CONCORD_COVERAGE_AVERAGING)
    #[arg(long, global = true)]
    coverage_averaging: Option<CoverageAveraging>,

    /// Clinic treatment placement: fixed_late or phase_heuristic
    /// (overrides CONCORD_CLINIC_PLACEMENT)
    #[arg(long, global = true)]
    clinic_placement: Option<ClinicPlacement>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a concord config file with the default policy
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Extract protocol elements as JSON
    Extract {
        /// Path to the protocol JSON file
        protocol: PathBuf,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report plan coverage against a protocol (exit 2 when misaligned)
    Validate {
        /// Path to the protocol JSON file
        protocol: PathBuf,
        /// Path to the plan draft (JSON or raw generated text)
        plan: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inject missing protocol elements into a plan draft
    Repair {
        /// Path to the protocol JSON file
        protocol: PathBuf,
        /// Path to the plan draft (JSON or raw generated text)
        plan: PathBuf,
        /// Output file path for the repaired plan (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate, repair if needed, and re-validate (exit 2 when unresolved)
    Check {
        /// Path to the protocol JSON file
        protocol: PathBuf,
        /// Path to the plan draft (JSON or raw generated text)
        plan: PathBuf,
        /// Output file path for the final plan
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check every protocol/plan pair listed in a TOML manifest
    Batch {
        /// Path to the batch manifest
        manifest: PathBuf,
        /// Maximum number of pairs checked at once
        #[arg(long, default_value_t = 4)]
        max_parallel: usize,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Execute the `concord init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  policy.coverage_averaging = {}", cfg.policy.coverage_averaging);
    println!("  policy.clinic_placement = {}", cfg.policy.clinic_placement);
    println!("  policy.late_phase_index = {}", cfg.policy.late_phase_index);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let overrides = PolicyOverrides {
        coverage_averaging: cli.coverage_averaging,
        clinic_placement: cli.clinic_placement,
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Extract { protocol, output } => {
            extract_cmd::run_extract(&protocol, output.as_deref())?;
        }
        Commands::Validate {
            protocol,
            plan,
            json,
        } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            let aligned = validate_cmd::run_validate(&protocol, &plan, json, &resolved.policy)?;
            if !aligned {
                std::process::exit(EXIT_MISALIGNED);
            }
        }
        Commands::Repair {
            protocol,
            plan,
            output,
        } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            repair_cmd::run_repair(&protocol, &plan, output.as_deref(), &resolved.policy)?;
        }
        Commands::Check {
            protocol,
            plan,
            output,
            json,
        } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            let pass = check_cmd::run_check(
                &protocol,
                &plan,
                output.as_deref(),
                json,
                &resolved.policy,
            )?;
            if !pass {
                std::process::exit(EXIT_MISALIGNED);
            }
        }
        Commands::Batch {
            manifest,
            max_parallel,
        } => {
            let resolved = ResolvedConfig::resolve(&overrides)?;
            let summary = batch_cmd::run_batch(&manifest, max_parallel, resolved.policy).await?;
            if summary.failed > 0 {
                anyhow::bail!("{} of {} pairs could not be checked", summary.failed, summary.total());
            }
            if summary.unresolved > 0 {
                std::process::exit(EXIT_MISALIGNED);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "concord", &mut std::io::stdout());
        }
    }

    Ok(())
}
