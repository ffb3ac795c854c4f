// src/download/paths.rs
// =============================================================================
// Maps remote paths to local paths.
//
// Example (default layout, out = "/tmp/out"):
//   URL:       https://github.com/acme/widgets/tree/main/docs
//   sub-path:  docs
//   remote:    docs/guide/intro.md
//   local:     /tmp/out/widgets/docs/guide/intro.md
//              ^out     ^root   ^download file name
//
// The sub-path prefix is stripped from the remote path and the rest is
// re-rooted under the run's target directory.
// =============================================================================

use std::path::{Path, PathBuf};

use crate::github::RepositoryDescriptor;

/// Where one downloaded file goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPathname {
    pub directory: PathBuf,
    pub filename: String,
}

impl LocalPathname {
    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// A file discovered while walking a directory
    pub fn for_entry(descriptor: &RepositoryDescriptor, out: &Path, remote_path: &str) -> Self {
        let relative = strip_sub_path(&descriptor.sub_path, remote_path);

        // Drop empty, "." and ".." components so a listing can never
        // escape the target directory
        let mut parts: Vec<&str> = relative
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .collect();

        let filename = parts
            .pop()
            .map(str::to_string)
            .unwrap_or_else(|| descriptor.download_file_name.clone());

        let mut directory = descriptor.target_path(out);
        directory.extend(parts);

        LocalPathname {
            directory,
            filename,
        }
    }

    /// The URL pointed at a single file
    pub fn for_single_file(descriptor: &RepositoryDescriptor, out: &Path) -> Self {
        LocalPathname {
            directory: descriptor.output_root(out),
            filename: descriptor.download_file_name.clone(),
        }
    }

    /// The zip of a whole repository
    pub fn for_archive(descriptor: &RepositoryDescriptor, out: &Path) -> Self {
        LocalPathname {
            directory: descriptor.output_root(out),
            filename: format!("{}.zip", descriptor.download_file_name),
        }
    }
}

fn strip_sub_path<'a>(sub_path: &str, remote_path: &'a str) -> &'a str {
    if sub_path.is_empty() {
        return remote_path;
    }
    match remote_path.strip_prefix(sub_path) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => remote_path,
    }
}
