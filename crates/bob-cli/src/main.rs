//! makei: build IBM i objects from `Rules.mk` descriptors.
//!
//! Plans the build with `bob_plan`, then runs the make engine over the plan
//! and reports which objects were created.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bob_plan::config::ProcessEnv;
use bob_plan::select::{dir_goal, path_selector};
use bob_plan::{BuildOutcome, MakeInvocation, OutcomeScanner, Planner, PlannerConfig};

mod ui;

/// Where the make engine is installed by default.
const DEFAULT_BOB_PATH: &str = "/QOpenSys/pkgs/lib/bob";

#[derive(Parser)]
#[command(name = "makei")]
#[command(about = "Build IBM i objects from Rules.mk descriptors")]
#[command(version)]
struct Cli {
    /// Log planning details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the whole project, or only the given targets
    Build {
        /// Targets (VAT300.MODULE), source files (functionsVAT/vat300.rpgle)
        /// or directory goals (dir_QDDSSRC)
        selectors: Vec<String>,

        /// Build one target
        #[arg(short, long, conflicts_with = "subdir")]
        target: Option<String>,

        /// Build every object of a subdirectory
        #[arg(short = 'd', long)]
        subdir: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compile source files or directories
    Compile {
        /// Source file or directory
        #[arg(short, long, conflicts_with = "files", required_unless_present = "files")]
        file: Option<PathBuf>,

        /// Colon-separated list of source files or directories
        #[arg(long)]
        files: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by every command that runs make.
#[derive(Args)]
struct RunArgs {
    /// Project root, holding iproj.json
    #[arg(short = 'C', long, default_value = ".")]
    project: PathBuf,

    /// Options passed through to make, e.g. "-j4"
    #[arg(short = 'o', long, allow_hyphen_values = true)]
    make_options: Option<String>,

    /// Make engine installation
    #[arg(long, default_value = DEFAULT_BOB_PATH)]
    bob_path: PathBuf,

    /// Environment variable for placeholders, KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            mut selectors,
            target,
            subdir,
            run,
        } => {
            selectors.extend(target);
            selectors.extend(subdir.as_deref().map(dir_goal));
            run_build(selectors, &run).await?;
        }

        Commands::Compile { file, files, run } => {
            let root = canonical_root(&run.project)?;
            let paths: Vec<PathBuf> = match (file, files) {
                (Some(file), _) => vec![file],
                (None, Some(files)) => files
                    .split(':')
                    .filter(|f| !f.is_empty())
                    .map(PathBuf::from)
                    .collect(),
                (None, None) => Vec::new(),
            };
            let selectors = paths
                .iter()
                .map(|path| path_selector(path, &root))
                .collect::<Result<Vec<_>, _>>()?;
            run_build(selectors, &run).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// `KEY=VALUE` with exactly one `=`.
fn parse_env_pair(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.contains('=') => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", pair)),
    }
}

fn canonical_root(project: &Path) -> miette::Result<PathBuf> {
    project
        .canonicalize()
        .map_err(|e| miette::miette!("Cannot access project directory {}: {}", project.display(), e))
}

/// Plans the build, runs make over the plan and summarizes the outcome.
async fn run_build(selectors: Vec<String>, run: &RunArgs) -> miette::Result<()> {
    let start = Instant::now();

    let overrides: HashMap<String, String> = run.env.iter().cloned().collect();
    let env = ProcessEnv::with_overrides(overrides);

    let mut config = PlannerConfig::new(&run.project);
    config.selectors = selectors;
    config.color = console::colors_enabled();

    let spinner = ui::spinner("Planning build...");
    let planned = Planner::new(config).plan(&env);
    spinner.finish_and_clear();
    let plan = planned?;

    ui::info(&format!(
        "Planned {} from {}",
        ui::count(plan.goals().len(), "goal"),
        ui::count(plan.descriptors().len(), "descriptor")
    ));
    ui::warnings(plan.warnings().len());

    let Some(invocation) = plan.make_invocation(&run.bob_path) else {
        ui::error("Nothing to build: no requested target matched");
        return Err(miette::miette!("no requested target matched a descriptor"));
    };
    let invocation = match &run.make_options {
        Some(options) => invocation.with_options(options),
        None => invocation,
    };
    ui::dim(&invocation.command_line());
    println!();

    let run = run_make(&invocation, plan.root()).await;
    plan.close()?;
    let outcome = match run? {
        MakeRun::Finished(outcome) => outcome,
        MakeRun::Interrupted => {
            println!();
            ui::error("Interrupted, make was stopped");
            return Err(miette::miette!("build interrupted"));
        }
    };

    ui::outcome(&outcome);
    ui::timing("Done", start.elapsed().as_millis());

    if !outcome.is_success() {
        return Err(miette::miette!("{}", outcome.summary()));
    }
    Ok(())
}

/// How a make run ended.
enum MakeRun {
    Finished(BuildOutcome),
    Interrupted,
}

/// Runs make, echoing its output while scanning for created and failed
/// objects. Ctrl-C stops make and returns so the plan can be cleaned up.
async fn run_make(invocation: &MakeInvocation, dir: &Path) -> miette::Result<MakeRun> {
    debug!(command = %invocation.command_line(), dir = %dir.display(), "running make");
    let mut child = Command::new(&invocation.program)
        .args(invocation.args())
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| miette::miette!("Failed to start {}: {}", invocation.program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| miette::miette!("{} output was not captured", invocation.program))?;

    let interrupt = async {
        // Without a handler there is nothing to wait for.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let Some(scanner) = stream_output(stdout, interrupt).await? else {
        let _ = child.kill().await;
        return Ok(MakeRun::Interrupted);
    };

    let status = child
        .wait()
        .await
        .map_err(|e| miette::miette!("Failed to wait for {}: {}", invocation.program, e))?;
    Ok(MakeRun::Finished(scanner.finish(status.success())))
}

/// Echoes and scans output lines until the output ends, or until `interrupt`
/// completes, which yields `None`.
async fn stream_output<R, F>(output: R, interrupt: F) -> miette::Result<Option<OutcomeScanner>>
where
    R: AsyncRead + Unpin,
    F: Future<Output = ()>,
{
    let mut scanner = OutcomeScanner::new();
    let mut lines = BufReader::new(output).lines();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            biased;
            _ = &mut interrupt => return Ok(None),
            line = lines.next_line() => {
                match line.map_err(|e| miette::miette!("Failed to read make output: {}", e))? {
                    Some(line) => {
                        println!("{}", line);
                        scanner.scan(&line);
                    }
                    None => return Ok(Some(scanner)),
                }
            }
        }
    }
}
