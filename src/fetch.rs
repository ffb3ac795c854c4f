// src/fetch.rs
// =============================================================================
// Runs one fetch from start to finish.
//
// Steps:
// 1. Resolve the URL into a RepositoryDescriptor (fails before any I/O)
// 2. Decide the rollback plan while nothing has been written yet
// 3. Start the connectivity monitor
// 4. Pick the mode:
//    - Archive:    URL is the repository root -> download <branch>.zip
//    - SingleFile: contents API answers with one object -> download it
//    - Directory:  contents API answers with a list -> walk the tree
// 5. On failure, roll back partial output (only if something was written)
//    and hand the error back
//
// --no-archive turns the repository root into a Directory walk instead of
// an archive download.
//
// Rust concepts:
// - match on Result: Every failure passes through one rollback point
// - Drop: The monitor stops itself when its handle goes out of scope
// =============================================================================

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::crawl::Walker;
use crate::download::{Downloader, LocalPathname, RollbackPlan, TransferStats};
use crate::error::FetchError;
use crate::github::{
    self, ApiClient, AuthManager, AuthState, Credential, Endpoints, LayoutOptions, Listing,
    RepositoryDescriptor,
};
use crate::monitor::{self, AbortSignal, MonitorConfig};

/// Everything the core needs, already merged from CLI flags and config file
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url: String,
    pub out: PathBuf,
    pub credential: Option<Credential>,
    pub always_use_auth: bool,
    /// Connectivity grace period; None or zero disables the forced abort
    pub timeout: Option<Duration>,
    pub layout: LayoutOptions,
    /// Walk the tree even when the URL is the repository root
    pub no_archive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Archive,
    SingleFile,
    Directory,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub mode: FetchMode,
    pub stats: TransferStats,
    /// The file, archive or directory that was written
    pub output: PathBuf,
    /// Active when the run ended up sending credentials
    pub auth_state: AuthState,
}

pub async fn fetch(
    options: &FetchOptions,
    endpoints: &Endpoints,
) -> Result<FetchReport, FetchError> {
    let probe_host = endpoints.probe_host.clone();
    fetch_with_probe(
        options,
        endpoints,
        MonitorConfig::new(options.timeout),
        move || monitor::dns_probe(probe_host.clone()),
    )
    .await
}

// Same as fetch(), with the connectivity check supplied by the caller
async fn fetch_with_probe<P, Fut>(
    options: &FetchOptions,
    endpoints: &Endpoints,
    monitor_config: MonitorConfig,
    probe: P,
) -> Result<FetchReport, FetchError>
where
    P: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send,
{
    let descriptor = github::resolve(&options.url, &options.layout, endpoints)?;
    tracing::info!(
        owner = %descriptor.owner,
        repo = %descriptor.repo,
        branch = %descriptor.branch,
        sub_path = %descriptor.sub_path,
        root_name = %descriptor.root_name,
        "resolved repository URL"
    );

    let archive_mode = descriptor.is_repository_root() && !options.no_archive;
    let output = if archive_mode {
        descriptor.archive_path(&options.out)
    } else {
        descriptor.target_path(&options.out)
    };
    let rollback = RollbackPlan::for_target(&output);
    tracing::debug!(?rollback, "rollback plan");

    let abort = AbortSignal::new();
    let mut monitor = monitor::spawn(monitor_config, probe, abort.clone());

    let auth = AuthManager::new(options.credential.clone(), options.always_use_auth);
    let mut downloader = Downloader::new(ApiClient::new(auth, abort)?);

    let result = if archive_mode {
        fetch_archive(&descriptor, options, &mut downloader).await
    } else {
        fetch_contents(&descriptor, options, &mut downloader).await
    };
    monitor.stop();

    match result {
        Ok(mode) => Ok(FetchReport {
            mode,
            stats: downloader.stats().clone(),
            output,
            auth_state: downloader.client().auth().state(),
        }),
        Err(error) => {
            if error.needs_rollback() && downloader.output_started() {
                if let Err(cleanup_error) = rollback.execute().await {
                    tracing::error!(
                        path = %rollback.path().display(),
                        %cleanup_error,
                        "could not remove partial output"
                    );
                }
            }
            Err(error)
        }
    }
}

async fn fetch_archive(
    descriptor: &RepositoryDescriptor,
    options: &FetchOptions,
    downloader: &mut Downloader,
) -> Result<FetchMode, FetchError> {
    tracing::info!(url = %descriptor.archive_url, "downloading repository archive");
    let destination = LocalPathname::for_archive(descriptor, &options.out);

    downloader.stats_mut().file_discovered();
    downloader.stats_mut().finish_traversal();
    downloader
        .download(&descriptor.archive_url, &destination)
        .await?;
    Ok(FetchMode::Archive)
}

async fn fetch_contents(
    descriptor: &RepositoryDescriptor,
    options: &FetchOptions,
    downloader: &mut Downloader,
) -> Result<FetchMode, FetchError> {
    let url = descriptor.listing_url(&descriptor.sub_path)?;

    match downloader.client().list(&url).await? {
        Listing::File(entry) => {
            let download_url = entry.download_url.ok_or_else(|| FetchError::Transfer {
                url: url.to_string(),
                message: format!("'{}' has no download URL", entry.path),
            })?;
            let destination = LocalPathname::for_single_file(descriptor, &options.out);

            downloader.stats_mut().file_discovered();
            downloader.stats_mut().finish_traversal();
            downloader.download(&download_url, &destination).await?;
            Ok(FetchMode::SingleFile)
        }
        Listing::Directory(entries) => {
            Walker::new(descriptor, &options.out)
                .run_with_root(downloader, entries)
                .await?;
            Ok(FetchMode::Directory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::RootDirectory;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn options(url: String, out: PathBuf) -> FetchOptions {
        FetchOptions {
            url,
            out,
            credential: None,
            always_use_auth: false,
            timeout: None,
            layout: LayoutOptions::default(),
            no_archive: false,
        }
    }

    async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_docs_listing(server: &MockServer) {
        mount(
            server,
            "/repos/acme/widgets/contents/docs",
            ResponseTemplate::new(200).set_body_json(json!([
                {"type": "file", "path": "docs/a.md", "download_url": format!("{}/raw/docs/a.md", server.uri())},
                {"type": "file", "path": "docs/b.md", "download_url": format!("{}/raw/docs/b.md", server.uri())}
            ])),
        )
        .await;
    }

    #[tokio::test]
    async fn test_repository_root_downloads_archive() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/acme/widgets/archive/master.zip",
            ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()),
        )
        .await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let options = options(
            format!("{}/acme/widgets", server.uri()),
            out.path().to_path_buf(),
        );

        let report = fetch(&options, &endpoints).await.unwrap();
        assert_eq!(report.mode, FetchMode::Archive);
        assert_eq!(report.stats.expected_total, 1);
        assert_eq!(report.stats.completed, 1);
        assert!(report.stats.is_complete());
        assert_eq!(report.output, out.path().join("widgets/widgets.zip"));
        assert_eq!(std::fs::read(&report.output).unwrap(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_directory_lands_under_repo_name() {
        let server = MockServer::start().await;
        mount_docs_listing(&server).await;
        mount(&server, "/raw/docs/a.md", ResponseTemplate::new(200).set_body_string("a")).await;
        mount(&server, "/raw/docs/b.md", ResponseTemplate::new(200).set_body_string("b")).await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let options = options(
            format!("{}/acme/widgets/tree/main/docs", server.uri()),
            out.path().to_path_buf(),
        );

        let report = fetch(&options, &endpoints).await.unwrap();
        assert_eq!(report.mode, FetchMode::Directory);
        assert_eq!(report.stats.expected_total, 2);
        assert!(report.stats.is_complete());
        assert_eq!(
            std::fs::read_to_string(out.path().join("widgets/docs/b.md")).unwrap(),
            "b"
        );
        assert!(out.path().join("widgets/docs/a.md").exists());
    }

    #[tokio::test]
    async fn test_directory_without_root_nesting() {
        let server = MockServer::start().await;
        mount_docs_listing(&server).await;
        mount(&server, "/raw/docs/a.md", ResponseTemplate::new(200)).await;
        mount(&server, "/raw/docs/b.md", ResponseTemplate::new(200)).await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let mut options = options(
            format!("{}/acme/widgets/tree/main/docs", server.uri()),
            out.path().to_path_buf(),
        );
        options.layout.root_directory = RootDirectory::Omit;

        fetch(&options, &endpoints).await.unwrap();
        assert!(out.path().join("docs/a.md").exists());
        assert!(out.path().join("docs/b.md").exists());
        assert!(!out.path().join("widgets").exists());
    }

    #[tokio::test]
    async fn test_single_object_downloads_one_file_without_walking() {
        let server = MockServer::start().await;
        // expect(1) on the listing proves the walker never lists again
        mount(
            &server,
            "/repos/acme/widgets/contents/src/lib.rs",
            ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "path": "src/lib.rs",
                "download_url": format!("{}/raw/src/lib.rs", server.uri())
            })),
        )
        .await;
        mount(
            &server,
            "/raw/src/lib.rs",
            ResponseTemplate::new(200).set_body_string("pub fn hi() {}"),
        )
        .await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let mut options = options(
            format!("{}/acme/widgets/blob/main/src/lib.rs", server.uri()),
            out.path().to_path_buf(),
        );
        options.layout.root_directory = RootDirectory::Omit;

        let report = fetch(&options, &endpoints).await.unwrap();
        assert_eq!(report.mode, FetchMode::SingleFile);
        assert_eq!(report.stats.expected_total, 1);
        assert_eq!(report.stats.completed, 1);
        assert!(!report.stats.whole_directory);
        assert_eq!(
            std::fs::read_to_string(out.path().join("lib.rs")).unwrap(),
            "pub fn hi() {}"
        );
    }

    #[tokio::test]
    async fn test_no_archive_walks_repository_root() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/repos/acme/widgets/contents",
            ResponseTemplate::new(200).set_body_json(json!([
                {"type": "file", "path": "README.md", "download_url": format!("{}/raw/README.md", server.uri())}
            ])),
        )
        .await;
        mount(&server, "/raw/README.md", ResponseTemplate::new(200).set_body_string("hi")).await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let mut options = options(
            format!("{}/acme/widgets", server.uri()),
            out.path().to_path_buf(),
        );
        options.no_archive = true;

        let report = fetch(&options, &endpoints).await.unwrap();
        assert_eq!(report.mode, FetchMode::Directory);
        assert!(out.path().join("widgets/widgets/README.md").exists());
    }

    #[tokio::test]
    async fn test_failure_rolls_back_new_output_directory() {
        let server = MockServer::start().await;
        mount_docs_listing(&server).await;
        mount(&server, "/raw/docs/a.md", ResponseTemplate::new(200).set_body_string("a")).await;
        mount(&server, "/raw/docs/b.md", ResponseTemplate::new(500)).await;

        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("sibling.txt"), "keep").unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let options = options(
            format!("{}/acme/widgets/tree/main/docs", server.uri()),
            root.path().join("fresh"),
        );

        let result = fetch(&options, &endpoints).await;
        assert!(matches!(result, Err(FetchError::Transfer { .. })));
        assert!(!root.path().join("fresh").exists());
        assert!(root.path().join("sibling.txt").exists());
    }

    #[tokio::test]
    async fn test_failure_in_existing_directory_keeps_other_content() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/acme/widgets/archive/master.zip",
            ResponseTemplate::new(403),
        )
        .await;

        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir(out.path().join("widgets")).unwrap();
        std::fs::write(out.path().join("widgets/notes.txt"), "keep").unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let options = options(
            format!("{}/acme/widgets", server.uri()),
            out.path().to_path_buf(),
        );

        let result = fetch(&options, &endpoints).await;
        assert!(matches!(
            result,
            Err(FetchError::RateLimitExceeded {
                authenticated: false
            })
        ));
        assert!(out.path().join("widgets/notes.txt").exists());
        assert!(!out.path().join("widgets/widgets.zip").exists());
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let out = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let options = options(
            "https://gitlab.com/acme/widgets".to_string(),
            out.path().to_path_buf(),
        );

        let result = fetch(&options, &endpoints).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_failed_first_listing_keeps_existing_target() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/repos/acme/widgets/contents/docs",
            ResponseTemplate::new(404),
        )
        .await;

        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir(out.path().join("docs")).unwrap();
        std::fs::write(out.path().join("docs/mine.txt"), "keep").unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let mut options = options(
            format!("{}/acme/widgets/tree/typo-branch/docs", server.uri()),
            out.path().to_path_buf(),
        );
        options.layout.root_directory = RootDirectory::Omit;

        let result = fetch(&options, &endpoints).await;
        assert!(matches!(result, Err(FetchError::NotFound { .. })));
        assert_eq!(
            std::fs::read_to_string(out.path().join("docs/mine.txt")).unwrap(),
            "keep"
        );
    }

    // Serves a file slowly and takes the network down while doing so
    struct GoesOffline {
        online: Arc<AtomicBool>,
    }

    impl Respond for GoesOffline {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.online.store(false, Ordering::SeqCst);
            ResponseTemplate::new(200)
                .set_body_string("a")
                .set_delay(Duration::from_millis(300))
        }
    }

    #[tokio::test]
    async fn test_lost_connectivity_aborts_and_rolls_back() {
        let server = MockServer::start().await;
        let online = Arc::new(AtomicBool::new(true));
        mount_docs_listing(&server).await;
        Mock::given(method("GET"))
            .and(path("/raw/docs/a.md"))
            .respond_with(GoesOffline {
                online: Arc::clone(&online),
            })
            .expect(1)
            .mount(&server)
            .await;
        // The abort is seen before the next request goes out
        Mock::given(method("GET"))
            .and(path("/raw/docs/b.md"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("sibling.txt"), "keep").unwrap();
        let endpoints = Endpoints::single_host(&server.uri()).unwrap();
        let mut options = options(
            format!("{}/acme/widgets/tree/main/docs", server.uri()),
            root.path().join("fresh"),
        );
        options.timeout = Some(Duration::from_millis(30));
        let monitor_config = MonitorConfig {
            interval: Duration::from_millis(10),
            grace: options.timeout,
        };

        let probe_state = Arc::clone(&online);
        let result = fetch_with_probe(&options, &endpoints, monitor_config, move || {
            let up = probe_state.load(Ordering::SeqCst);
            async move { up }
        })
        .await;

        assert!(matches!(
            result,
            Err(FetchError::ConnectivityLost { grace_ms: 30 })
        ));
        assert!(!root.path().join("fresh").exists());
        assert!(root.path().join("sibling.txt").exists());
    }
}
