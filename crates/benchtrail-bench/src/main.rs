//! `benchtrail`: run benchmarks, replay them over history, inspect results.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use benchtrail_bench::history::{HistoryOptions, HistoryRunner};
use benchtrail_bench::launcher::ProcessLauncher;
use benchtrail_bench::pipeline::{run_partition, run_pipeline, PipelineOptions};
use benchtrail_bench::report;
use benchtrail_bench::sync::ManifestSync;
use benchtrail_bench::vcs::{CheckoutRevision, GitRepository};
use benchtrail_core::config::CliOverrides;
use benchtrail_core::errors::{ErrorCode, HistoryError};
use benchtrail_core::traits::{Cancellable, CancellationToken};
use benchtrail_core::BenchtrailConfig;
use benchtrail_storage::{ResultStore, SqliteResultStore};
use clap::{Parser, Subcommand};

const EXIT_PARTIAL: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "benchtrail", version, about = "Performance regression harness across git history")]
struct Cli {
    /// Project root holding `benchtrail.toml` and the data directory.
    #[arg(long, global = true, default_value = ".")]
    config_root: PathBuf,

    /// Timed runs per benchmark and size.
    #[arg(long, global = true)]
    runs: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the result store.
    Setup {
        /// Drop existing results.
        #[arg(long)]
        overwrite: bool,
    },
    /// Benchmark the current checkout and append the results.
    Run {
        /// Directory containing `bench*` manifests.
        path: PathBuf,
        #[arg(short, long)]
        category: Option<String>,
        /// Print results without storing them.
        #[arg(long)]
        dry: bool,
    },
    /// Print stored results.
    Show {
        /// Exact category name.
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Benchmark historical commits with the current benchmark suite.
    History {
        path: PathBuf,
        #[arg(required = true, num_args = 1..)]
        commits: Vec<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Exit with status 2 if any commit failed.
        #[arg(long)]
        fail_on_partial: bool,
    },
    /// Relative performance per series over stored commits.
    Trend {
        #[arg(short, long)]
        category: Vec<String>,
    },
    /// Child side of `history`: benchmark the working directory's checkout
    /// and write a partition file.
    #[command(name = "run-partition", hide = true)]
    RunPartition {
        bench_root: PathBuf,
        partition: PathBuf,
        #[arg(default_value = "")]
        category: String,
    },
}

fn main() -> ExitCode {
    benchtrail_core::tracing::init_tracing();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn coded<E: ErrorCode + std::fmt::Display>(e: E) -> String {
    e.coded_string()
}

fn execute(cli: Cli) -> Result<ExitCode, String> {
    let root = cli.config_root.as_path();
    let fail_on_partial = match &cli.command {
        Command::History {
            fail_on_partial: true,
            ..
        } => Some(true),
        _ => None,
    };
    let overrides = CliOverrides {
        runs: cli.runs,
        data_dir: None,
        fail_on_partial,
    };
    let config = BenchtrailConfig::load(root, Some(&overrides)).map_err(coded)?;

    match cli.command {
        Command::Setup { overwrite } => {
            let store = open_store(&config, root)?;
            if overwrite {
                store.create_or_replace().map_err(coded)?;
            } else {
                store.create().map_err(coded)?;
            }
            println!(
                "Result store ready at {}",
                config.storage.effective_db_path(root).display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            path,
            category,
            dry,
        } => {
            let options = PipelineOptions::from_config(&config.run);
            let revision = CheckoutRevision::new(root);
            let rows = run_pipeline(&path, category.as_deref(), &options, &revision)
                .map_err(coded)?;
            print!("{}", report::render_records(&rows));
            if !dry {
                let store = open_store(&config, root)?;
                let inserted = store.insert(&rows).map_err(coded)?;
                println!("Stored {inserted} rows.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { category } => {
            let store = open_store(&config, root)?;
            let rows = match category {
                Some(c) => store.scan_category(&c),
                None => store.scan(),
            }
            .map_err(coded)?;
            print!("{}", report::render_records(&rows));
            Ok(ExitCode::SUCCESS)
        }
        Command::History {
            path,
            commits,
            category,
            ..
        } => history(&config, root, &path, commits, category),
        Command::Trend { category } => {
            let store = open_store(&config, root)?;
            let rows = store.scan().map_err(coded)?;
            let series = report::compute_trend(&rows, &category);
            print!("{}", report::render_trend(&series));
            Ok(ExitCode::SUCCESS)
        }
        Command::RunPartition {
            bench_root,
            partition,
            category,
        } => {
            let options = PipelineOptions::from_config(&config.run);
            let category = Some(category.as_str()).filter(|c| !c.is_empty());
            let revision = CheckoutRevision::new(".");
            let rows = run_partition(&bench_root, &partition, category, &options, &revision)
                .map_err(coded)?;
            tracing::info!(rows, partition = %partition.display(), "partition written");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn history(
    config: &BenchtrailConfig,
    root: &Path,
    bench_root: &Path,
    commits: Vec<String>,
    category: Option<String>,
) -> Result<ExitCode, String> {
    let repo = GitRepository::discover(root).map_err(coded)?;
    let sync = match config.history.sync_command.clone() {
        Some(argv) => ManifestSync::with_command(argv),
        None => ManifestSync::detect(),
    };
    let launcher = ProcessLauncher::from_config(config).map_err(coded)?;
    let store = open_store(config, root)?;

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, cleaning up the active worktree...");
        handler_token.cancel();
    }) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let options = HistoryOptions::from_config(config, bench_root, category);
    let runner = HistoryRunner::new(
        &repo,
        &sync,
        &launcher,
        config.storage.effective_data_dir(root),
        options,
    )
    .with_cancellation(token);

    match runner.run(&commits, &store) {
        Ok(sweep) => {
            print!("{}", report::render_sweep(&sweep));
            if sweep.is_partial() && config.history.effective_fail_on_partial() {
                Ok(ExitCode::from(EXIT_PARTIAL))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(e @ HistoryError::Interrupted { .. }) => {
            eprintln!("{}", e.coded_string());
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Err(e) => Err(e.coded_string()),
    }
}

fn open_store(config: &BenchtrailConfig, root: &Path) -> Result<SqliteResultStore, String> {
    SqliteResultStore::open(&config.storage.effective_db_path(root)).map_err(coded)
}
