// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Values given here win over the config file (see config.rs).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - FromStr: clap parses --auth and --root-directory through our own types
// - Option<T>: A flag that was not given is None, so the config file can
//   fill it in
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::github::{Credential, RootDirectory};

#[derive(Parser, Debug)]
#[command(
    name = "repo-fetch",
    version,
    about = "Download a file, a directory or a whole repository from a GitHub URL",
    long_about = "repo-fetch takes a GitHub URL and recreates what it points at on disk. \
                  A file URL downloads that file, a directory URL downloads the directory \
                  tree, and a bare repository URL downloads the repository as a zip archive."
)]
pub struct Cli {
    /// GitHub URL, e.g. https://github.com/owner/repo/tree/main/docs
    pub url: String,

    /// Directory to write into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Credentials as <username>:<token>
    ///
    /// Only used once GitHub rate limits anonymous requests, unless
    /// --always-use-auth is given.
    #[arg(long, value_name = "USER:TOKEN")]
    pub auth: Option<Credential>,

    /// Send credentials with every request from the start
    #[arg(long)]
    pub always_use_auth: bool,

    /// Give up after the network has been unreachable this long (milliseconds)
    ///
    /// 0 or absent keeps waiting forever.
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Name of the downloaded file or directory (defaults to the last path segment)
    #[arg(long, value_name = "NAME")]
    pub file_name: Option<String>,

    /// Directory to nest the output in; "false" writes straight into --out
    ///
    /// Defaults to the repository name.
    #[arg(long, value_name = "NAME|false")]
    pub root_directory: Option<RootDirectory>,

    /// Download a bare repository URL file by file instead of as a zip archive
    #[arg(long)]
    pub no_archive: bool,

    /// Config file with fallback values for auth, alwaysUseAuth and timeout
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
