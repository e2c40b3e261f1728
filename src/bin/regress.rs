use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sim_tools::engine::DemoHost;
use sim_tools::runner::{self, RunOptions, UpdateMode};

/// Snapshot regression harness for the built-in sandbox demos.
///
/// Every demo is run twice per invocation — captured before stepping and
/// again after `--frames` steps — and both captures are compared against
/// the stored references.
#[derive(Parser, Debug)]
#[command(name = "regress", version, about = "Compare demo snapshots against stored references")]
struct Cli {
    /// Re-baseline a single scenario's references.
    #[arg(long, value_name = "NAME")]
    update: Option<String>,

    /// Re-baseline every scenario's references.
    #[arg(long = "updateAll")]
    update_all: bool,

    /// Write structural diff logs for frames that differ.
    #[arg(long)]
    diff: bool,

    /// Reference snapshot directory.
    #[arg(long, default_value = "tests/refs")]
    refs: PathBuf,

    /// Diff log directory.
    #[arg(long, default_value = "tests/diffs")]
    diffs: PathBuf,

    /// Discrete steps between the two captured frames.
    #[arg(long, default_value_t = 10)]
    frames: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sim_tools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let update = if cli.update_all {
        UpdateMode::All
    } else if let Some(name) = cli.update {
        UpdateMode::Scenario(name)
    } else {
        UpdateMode::None
    };
    let options = RunOptions {
        frames: cli.frames,
        update,
        write_diffs: cli.diff,
        refs_root: cli.refs,
        diffs_root: cli.diffs,
    };

    let mut host = DemoHost::standard();
    let report = match runner::run(&mut host, &options) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("regress: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", report.marks());

    let created = report.created();
    if !created.is_empty() {
        println!("updated {}", quoted(&created));
    }

    if report.passed() {
        println!("ok");
        return ExitCode::SUCCESS;
    }

    println!();
    println!("changes detected on:");
    println!("{}", quoted(&report.changed()));
    println!();
    println!("review, then --update [name] or --updateAll");
    println!("use --diff for diff log");
    ExitCode::FAILURE
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
