// src/download/cleanup.rs
// =============================================================================
// Rolls back partial output when a run fails.
//
// The plan is decided once, before anything is written:
//
// - If some directory on the way to the target does not exist yet, the run
//   is going to create it. On failure we delete the top-most such directory
//   with everything under it: the run created all of it.
//
// - Otherwise the parent of the target already exists and may hold other
//   things. On failure we delete only the target itself (the single file,
//   the archive, or the downloaded directory), never its siblings.
//
// Rust concepts:
// - Path::ancestors(): Iterates parent, grandparent, ... up to the root
// - io::ErrorKind::NotFound: "already gone" counts as success here
// =============================================================================

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackPlan {
    /// This directory did not exist before the run; remove all of it
    RemoveNewDirectory(PathBuf),
    /// The target's parent pre-existed; remove only the target
    RemoveTarget(PathBuf),
}

impl RollbackPlan {
    /// Inspects the filesystem; call before the run writes anything
    pub fn for_target(target: &Path) -> Self {
        let mut topmost_new = None;
        for ancestor in target.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() || ancestor.exists() {
                break;
            }
            topmost_new = Some(ancestor.to_path_buf());
        }

        match topmost_new {
            Some(directory) => RollbackPlan::RemoveNewDirectory(directory),
            None => RollbackPlan::RemoveTarget(target.to_path_buf()),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RollbackPlan::RemoveNewDirectory(path) | RollbackPlan::RemoveTarget(path) => path,
        }
    }

    pub async fn execute(&self) -> io::Result<()> {
        let path = self.path();
        let removed = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) if metadata.is_dir() => tokio::fs::remove_dir_all(path).await,
            Ok(_) => tokio::fs::remove_file(path).await,
            Err(e) => Err(e),
        };

        match removed {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed partial output");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
