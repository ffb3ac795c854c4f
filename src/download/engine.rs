// src/download/engine.rs
// =============================================================================
// Downloads one file at a time and keeps the progress counters.
//
// Counters:
// - expected_total grows as the walker discovers files (we never know the
//   final number up front, the contents API has no recursive count)
// - completed grows as downloads finish
// - the run is complete only when the walker says traversal is done AND
//   completed == expected_total
//
// The downloader also remembers whether it has touched the filesystem yet.
// Rollback only runs once output has begun; a run that fails on its first
// request must leave whatever was already on disk alone.
//
// A failed download is not retried here. The error goes back up; the only
// retry is the single 403 escalation inside ApiClient.
//
// Rust concepts:
// - Streams: The response body arrives in chunks we write as they come
// - tokio::fs: Async file I/O so the runtime is never blocked
// =============================================================================

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::paths::LocalPathname;
use crate::error::FetchError;
use crate::github::ApiClient;

/// Progress counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub expected_total: usize,
    pub completed: usize,
    pub traversal_done: bool,
    /// True when the run walked a directory (vs one file or an archive)
    pub whole_directory: bool,
}

impl TransferStats {
    pub fn file_discovered(&mut self) {
        self.expected_total += 1;
    }

    pub fn file_completed(&mut self) {
        debug_assert!(self.completed < self.expected_total);
        self.completed += 1;
    }

    pub fn finish_traversal(&mut self) {
        self.traversal_done = true;
    }

    pub fn is_complete(&self) -> bool {
        self.traversal_done && self.completed == self.expected_total
    }
}

pub struct Downloader {
    client: ApiClient,
    stats: TransferStats,
    output_started: bool,
}

impl Downloader {
    pub fn new(client: ApiClient) -> Self {
        Downloader {
            client,
            stats: TransferStats::default(),
            output_started: false,
        }
    }

    pub fn client(&mut self) -> &mut ApiClient {
        &mut self.client
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut TransferStats {
        &mut self.stats
    }

    /// True once a directory or file has been created on disk
    pub fn output_started(&self) -> bool {
        self.output_started
    }

    /// Fetches `url` into `destination`, replacing any existing file
    pub async fn download(
        &mut self,
        url: &str,
        destination: &LocalPathname,
    ) -> Result<(), FetchError> {
        let response = self.client.get(url).await?;

        self.output_started = true;
        tokio::fs::create_dir_all(&destination.directory).await?;
        let path = destination.full_path();
        let mut file = tokio::fs::File::create(&path).await?;

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        self.stats.file_completed();
        println!(
            "   Downloaded {}/{}: {}",
            self.stats.completed,
            self.stats.expected_total,
            path.display()
        );

        if self.stats.is_complete() {
            tracing::info!(files = self.stats.completed, "transfer complete");
        }
        Ok(())
    }
}
