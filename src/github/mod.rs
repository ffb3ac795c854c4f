// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub.
//
// Currently implements:
// - Resolving a repository URL into owner/repo/branch/sub-path (descriptor)
// - Contents API response types (contents)
// - The credential escalation policy (auth)
// - Sending requests with auth, retry-once-on-403 and status mapping (client)
// =============================================================================

mod auth;
mod client;
mod contents;
mod descriptor;

pub use auth::{AuthManager, AuthState, Credential};
pub use client::ApiClient;
pub use contents::{ContentEntry, EntryKind, Listing};
pub use descriptor::{resolve, Endpoints, LayoutOptions, RepositoryDescriptor, RootDirectory};
