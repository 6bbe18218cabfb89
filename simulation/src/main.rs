//! Replicated Log - Optimistic Replication Simulator
//!
//! Drives replicas of a counter store that exchange logs filtered by a
//! matrix clock, either interactively or through scripted scenarios.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use replog_logging::{FileConfig, LogConfig, ReplogSubscriberBuilder};

use replog_simulation::{SimConfig, Session, scenarios};

#[derive(Parser)]
#[command(
    name = "replog",
    about = "Matrix-clock optimistic replication of a counter store",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSONL logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin until a blank line
    Repl {
        /// Number of replicas
        #[arg(short, long, default_value = "3")]
        replicas: usize,
    },

    /// Run the canonical three-replica walkthrough
    Canonical,

    /// Run the 1 -> 2 -> 3 relay scenario
    Relay,

    /// Show an increment applied twice through two delivery paths
    Hazard,

    /// Run random operations with loss, duplication and reordering
    Chaos {
        /// Number of random steps
        #[arg(short, long)]
        ops: Option<u64>,

        /// Number of replicas
        #[arg(short, long)]
        replicas: Option<usize>,

        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Probability a handled transmission is lost
        #[arg(long)]
        drop: Option<f64>,

        /// Probability a handled transmission is copied
        #[arg(long)]
        duplicate: Option<f64>,

        /// JSON file with a full configuration; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a file of commands
    Script {
        /// Command file, one command per line
        file: PathBuf,

        /// Number of replicas
        #[arg(short, long, default_value = "3")]
        replicas: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let config = if cli.verbose {
        LogConfig::development()
    } else {
        LogConfig {
            default_level: "warn".to_string(),
            ..Default::default()
        }
    };
    let mut builder = ReplogSubscriberBuilder::new().with_config(config);
    if let Some(directory) = cli.log_dir {
        builder = builder.with_file_output(FileConfig {
            directory,
            ..Default::default()
        });
    }
    let _log_guard = builder.try_init().context("failed to initialize logging")?;

    match cli.command {
        Commands::Repl { replicas } => {
            run_repl(replicas)?;
        }
        Commands::Canonical => {
            scenarios::run_canonical_scenario()?;
        }
        Commands::Relay => {
            scenarios::run_relay_scenario()?;
        }
        Commands::Hazard => {
            scenarios::run_duplicate_hazard_scenario()?;
        }
        Commands::Chaos {
            ops,
            replicas,
            seed,
            drop,
            duplicate,
            config,
            json,
        } => {
            let mut sim_config = match config {
                Some(path) => SimConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimConfig::default(),
            };
            if let Some(ops) = ops {
                sim_config.operations = ops;
            }
            if let Some(replicas) = replicas {
                sim_config.replica_count = replicas;
            }
            if seed.is_some() {
                sim_config.seed = seed;
            }
            if let Some(p) = drop {
                sim_config.drop_probability = p;
            }
            if let Some(p) = duplicate {
                sim_config.duplicate_probability = p;
            }

            let report = scenarios::run_chaos(&sim_config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                scenarios::print_chaos_report(&report);
            }
        }
        Commands::Script { file, replicas } => {
            let script = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let session = Session::new(replicas)?;
            let failures = session.run_script(&script, io::stdout().lock(), io::stderr().lock())?;
            if failures > 0 {
                anyhow::bail!("{failures} command(s) failed");
            }
        }
    }

    Ok(())
}

fn run_repl(replica_count: usize) -> anyhow::Result<()> {
    let session = Session::new(replica_count)?;

    println!("Replicated log with {replica_count} replicas. Type Help for commands, a blank line to exit.");

    session.run_interactive(io::stdin().lock(), io::stdout().lock(), io::stderr().lock())?;
    Ok(())
}
