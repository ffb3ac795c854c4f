// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the config file and merge it with the arguments
// 3. Run the fetch (resolve URL, download, roll back on failure)
// 4. Exit with proper code (0 = success, 1 = transfer failed, 2 = usage error)
//
// Rust concepts used:
// - async/await: Network and file I/O without blocking
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to turn outcomes into exit codes
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - JSON config file
mod crawl;         // src/crawl/ - remote directory traversal
mod download;      // src/download/ - writing files, progress, rollback
mod error;         // src/error.rs - failure kinds
mod fetch;         // src/fetch.rs - one complete run
mod github;        // src/github/ - URL resolution, API access, auth
mod logging;       // src/logging.rs - tracing setup
mod monitor;       // src/monitor.rs - background connectivity check

use clap::Parser;
use cli::Cli;
use fetch::{FetchMode, FetchReport};
use github::{AuthState, Endpoints};

use anyhow::Result;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Bad URL, bad config: nothing was written
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = everything downloaded
//   Ok(1) = transfer failed (partial output was rolled back)
//   Err   = usage or config error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let file = config::load(cli.config.as_deref())?;
    let options = config::merge(&cli, file)?;

    println!("🔍 Fetching {}", options.url);

    match fetch::fetch(&options, &Endpoints::default()).await {
        Ok(report) => {
            print_summary(&report);
            Ok(0)
        }
        Err(e) if e.needs_rollback() => {
            eprintln!("❌ {}", e);
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(report: &FetchReport) {
    let what = match report.mode {
        FetchMode::Archive => "repository archive",
        FetchMode::SingleFile => "file",
        FetchMode::Directory => "directory",
    };

    println!();
    println!("✅ Downloaded {} to {}", what, report.output.display());
    if report.stats.whole_directory {
        println!("   📋 Files: {}", report.stats.completed);
    }
    if report.auth_state == AuthState::Active {
        println!("   🔐 Requests were authenticated");
    }
}
