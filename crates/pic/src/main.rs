//! Pic CLI - Raw negative collection manager.
//!
//! Pic keeps a directory of raw negatives as an indexed repository:
//! checksums, camera metadata, extracted thumbnails and processing
//! history per negative, maintained by a concurrent worker pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Start a repository in the current directory
//! pic init
//!
//! # Ingest negatives through the default recipe
//! pic add DSC_0001.NEF DSC_0002.NEF
//!
//! # Verify stored checksums
//! pic check
//!
//! # Show extracted thumbnails in the configured viewer
//! pic view
//! ```

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use signal_hook::consts::{SIGINT, SIGTERM};

mod cli;
mod logging;

/// Pic - Raw negative collection manager.
#[derive(Parser, Debug)]
#[command(name = "pic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Repository location: a local path, file:// or ssh:// URL
    #[arg(long, global = true, default_value = ".")]
    repo: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new repository
    Init,

    /// Add negatives to the index and run them through a recipe
    Add(cli::add::AddArgs),

    /// Remove negatives, their sidecars and their index entries
    Remove(cli::remove::RemoveArgs),

    /// List indexed negatives or their derived files
    List(cli::list::ListArgs),

    /// Open thumbnails in an external viewer
    View(cli::view::ViewArgs),

    /// Verify stored checksums against file contents
    Check,

    /// Migrate an old index format
    Migrate,

    /// Update index entries in place
    #[command(hide = true)]
    Update,
}

/// Interrupt state shared with long-running commands.
#[derive(Clone)]
pub struct Interrupt {
    /// Raised by SIGINT/SIGTERM; the pipeline drains and exits early.
    pub flag: Arc<AtomicBool>,
    /// The signal number, for the `128 + N` exit convention.
    pub signal: Arc<AtomicUsize>,
}

impl Interrupt {
    fn install() -> anyhow::Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = Arc::new(AtomicUsize::new(0));
        for sig in [SIGINT, SIGTERM] {
            signal_hook::flag::register(sig, Arc::clone(&flag))?;
            signal_hook::flag::register_usize(sig, Arc::clone(&signal), sig as usize)?;
        }
        Ok(Self { flag, signal })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging settings live in the repo config; peek at it before any
    // command runs so early failures are logged too.
    logging::init(&logging::peek(&cli.repo), cli.verbose);
    tracing::debug!("pic v{}", pic_core::VERSION);

    let interrupt = match Interrupt::install() {
        Ok(interrupt) => interrupt,
        Err(e) => {
            eprintln!("pic: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Init => cli::init::execute(&cli.repo).map(|()| 0),
        Commands::Add(args) => cli::add::execute(&cli.repo, &args, &interrupt).map(|()| 0),
        Commands::Remove(args) => cli::remove::execute(&cli.repo, &args).map(|()| 0),
        Commands::List(args) => cli::list::execute(&cli.repo, &args).map(|()| 0),
        Commands::View(args) => cli::view::execute(&cli.repo, &args).map(|()| 0),
        Commands::Check => cli::check::execute(&cli.repo),
        Commands::Migrate => cli::migrate::execute("migrate"),
        Commands::Update => cli::migrate::execute("update"),
    };

    let signal = interrupt.signal.load(Ordering::SeqCst);
    match result {
        Ok(_) if signal != 0 => ExitCode::from(128 + signal as u8),
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("pic: {e:#}");
            ExitCode::FAILURE
        }
    }
}
