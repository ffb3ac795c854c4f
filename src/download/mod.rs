// src/download/mod.rs
// =============================================================================
// This module writes remote files to disk.
//
// Submodules:
// - paths: Maps a remote path to a local directory + file name
// - engine: Downloads a file and tracks progress counters
// - cleanup: Removes partial output after a failed run
// =============================================================================

mod cleanup;
mod engine;
mod paths;

pub use cleanup::RollbackPlan;
pub use engine::{Downloader, TransferStats};
pub use paths::LocalPathname;
