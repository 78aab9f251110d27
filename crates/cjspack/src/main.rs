use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cjspack::{config::Config, orchestrator::BundleOrchestrator};
use clap::Parser;
use log::{LevelFilter, debug};

#[derive(Parser, Debug)]
#[command(name = "cjspack", version, about = "Bundle CommonJS modules into a single script")]
struct Cli {
    /// Entry module [default: ./src/index.js]
    entry: Option<PathBuf>,

    /// Bundle to write [default: ./dist/index.js]
    output: Option<PathBuf>,

    /// Configuration file to use instead of ./cjspack.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root that module keys are relative to [default: current directory]
    #[arg(long)]
    root: Option<PathBuf>,

    /// Print the bundle to stdout instead of writing the output file
    #[arg(long)]
    stdout: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    // Paths given on the command line are relative to the working directory,
    // configured defaults to the project root
    config.root = absolute(&config.root)?;
    let entry = match cli.entry {
        Some(entry) => absolute(&entry)?,
        None => config.root.join(&config.entry),
    };
    let output = match cli.output {
        Some(output) => absolute(&output)?,
        None => config.root.join(&config.output),
    };
    debug!("Using configuration: {config:?}");

    let orchestrator = BundleOrchestrator::new(config);
    if cli.stdout {
        let bundle = orchestrator.bundle_to_string(&entry)?;
        io::stdout()
            .lock()
            .write_all(bundle.as_bytes())
            .context("Failed to write bundle to stdout")?;
    } else {
        orchestrator.bundle(&entry, &output)?;
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}
