// src/crawl/walker.rs
// =============================================================================
// Walks a remote directory tree and downloads every file in it.
//
// How it works:
// 1. Start with the sub-path from the URL; the caller has already listed it
//    (that listing is how it knew the target is a directory)
// 2. List each queued directory through the contents API
// 3. Queue every "dir" entry, download every "file" entry right away
// 4. Repeat until the queue is empty, then mark traversal as done
//
// Downloads happen one at a time, in discovery order. Entries that are
// neither a directory nor a downloadable file (submodules, symlinks
// without a download URL, ...) are logged and skipped.
// =============================================================================

use std::path::Path;

use super::queue::TraversalQueue;
use crate::download::{Downloader, LocalPathname};
use crate::error::FetchError;
use crate::github::{ContentEntry, EntryKind, Listing, RepositoryDescriptor};

pub struct Walker<'a> {
    descriptor: &'a RepositoryDescriptor,
    out: &'a Path,
    queue: TraversalQueue,
}

impl<'a> Walker<'a> {
    pub fn new(descriptor: &'a RepositoryDescriptor, out: &'a Path) -> Self {
        Walker {
            descriptor,
            out,
            queue: TraversalQueue::seeded(&descriptor.sub_path),
        }
    }

    /// Walks everything, reusing a listing of the starting directory that
    /// the caller already fetched
    pub async fn run_with_root(
        mut self,
        downloader: &mut Downloader,
        root_entries: Vec<ContentEntry>,
    ) -> Result<(), FetchError> {
        downloader.stats_mut().whole_directory = true;
        self.queue.pop();
        self.visit_all(downloader, root_entries).await?;
        self.drain(downloader).await
    }

    async fn drain(&mut self, downloader: &mut Downloader) -> Result<(), FetchError> {
        while let Some(remote_dir) = self.queue.pop() {
            let url = self.descriptor.listing_url(&remote_dir)?;
            let entries = match downloader.client().list(&url).await? {
                Listing::Directory(entries) => entries,
                // A queued path turned out to be a file; treat it as a
                // one-entry directory
                Listing::File(entry) => vec![entry],
            };
            self.visit_all(downloader, entries).await?;
        }

        downloader.stats_mut().finish_traversal();
        Ok(())
    }

    async fn visit_all(
        &mut self,
        downloader: &mut Downloader,
        entries: Vec<ContentEntry>,
    ) -> Result<(), FetchError> {
        for entry in entries {
            match (entry.kind, entry.download_url) {
                (EntryKind::Dir, _) => {
                    self.queue.push(entry.path);
                }
                (EntryKind::File, Some(download_url)) => {
                    let destination =
                        LocalPathname::for_entry(self.descriptor, self.out, &entry.path);
                    downloader.stats_mut().file_discovered();
                    downloader.download(&download_url, &destination).await?;
                }
                (kind, _) => {
                    tracing::warn!(
                        path = %entry.path,
                        ?kind,
                        "skipping entry that is not a downloadable file"
                    );
                }
            }
        }
        Ok(())
    }
}
