// src/crawl/mod.rs
// =============================================================================
// This module handles walking a remote directory tree.
//
// Features:
// - Breadth-first traversal of the GitHub contents API
// - Each file is downloaded as soon as it is discovered
// - Works from the URL's sub-path down; nothing above it is touched
//
// Why walk?
// - The contents API lists one directory per request
// - There is no recursive listing with download URLs, so we have to
//   visit every directory ourselves
// =============================================================================

mod queue;
mod walker;

pub use walker::Walker;
