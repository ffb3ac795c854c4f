// src/github/contents.rs
// =============================================================================
// Types for the GitHub contents API.
//
// GET /repos/{owner}/{repo}/contents/{path}?ref={branch} answers with:
//   - a JSON array of entries when {path} is a directory
//   - a single JSON object when {path} is a file
//
// We only read the fields we need (type, path, download_url); serde ignores
// the rest.
// =============================================================================

use serde::Deserialize;

/// What a contents entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    /// Anything GitHub adds later
    #[serde(other)]
    Other,
}

/// One entry of a directory listing (or the single object for a file)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Full path from the repository root, e.g. "docs/guide/intro.md"
    pub path: String,
    /// Raw download URL; null for directories and submodules
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Body of a contents API response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}
