//! spanlist CLI
//!
//! Reads `insert` / `delete` / `find` commands (one per line) and runs them
//! against a named record set.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;
use spanlist::command::Interpreter;
use spanlist::{Config, FlushPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// spanlist command driver
#[derive(Parser, Debug)]
#[command(name = "spanlist-cli")]
#[command(about = "Run insert/delete/find commands against a persistent skip list")]
#[command(version)]
struct Args {
    /// Directory holding the collection file
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Collection name (file is <data_dir>/<name>.bin)
    #[arg(short, long, default_value = "records")]
    name: String,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Seed for tower heights
    #[arg(long)]
    seed: Option<u64>,

    /// Write headers back after every command instead of only at exit
    #[arg(long)]
    eager_flush: bool,

    /// Start from an empty collection
    #[arg(long)]
    reset: bool,
}

fn main() {
    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().data_dir(&args.data_dir);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if args.eager_flush {
        builder = builder.flush_policy(FlushPolicy::EveryWrite);
    }
    let config = builder.build();

    tracing::debug!("spanlist CLI v{}", spanlist::VERSION);

    if let Err(e) = run(&args, &config) {
        tracing::error!("{}", e);
        eprintln!("spanlist-cli: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: &Config) -> spanlist::Result<()> {
    let mut interpreter = Interpreter::open(config, &args.name)?;
    if args.reset {
        interpreter.set_mut().clear()?;
    }

    let stdout = io::stdout();
    let mut output = stdout.lock();

    let summary = match &args.input {
        Some(path) => interpreter.run(BufReader::new(File::open(path)?), &mut output)?,
        None => interpreter.run(io::stdin().lock(), &mut output)?,
    };

    tracing::info!(
        executed = summary.executed,
        rejected = summary.rejected,
        "Finished"
    );

    interpreter.close()
}
