// src/github/descriptor.rs
// =============================================================================
// This module turns a GitHub web URL into a RepositoryDescriptor.
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/branch
//   - https://github.com/owner/repo/tree/branch/some/sub/path
//   - https://github.com/owner/repo/blob/branch/path/to/file.rs
//
// The path is read positionally: owner, repo, then a fixed "tree"/"blob"
// segment we skip, then the branch, then everything else is the sub-path.
//
// From those pieces we derive:
//   - the contents API prefix/postfix used to list any remote path
//   - the archive URL used when the whole repository is requested
//   - the local names (download file name, root directory name)
//
// Resolution is pure: no network, no filesystem.
//
// Rust concepts:
// - url::Url: To split a URL into host and path segments
// - FromStr: So clap can parse --root-directory straight into an enum
// - PathBuf: Owned filesystem paths built with join()
// =============================================================================

use std::path::{Path, PathBuf};
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

use crate::error::FetchError;

/// Branch used when the URL does not name one
pub const DEFAULT_BRANCH: &str = "master";

/// Where requests go. Tests point these at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Web host that repository URLs must live on (and that serves archives)
    pub web: Url,
    /// REST API base
    pub api: Url,
    /// host:port resolved by the connectivity probe
    pub probe_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            web: Url::parse("https://github.com").expect("static URL is valid"),
            api: Url::parse("https://api.github.com").expect("static URL is valid"),
            probe_host: "github.com:443".to_string(),
        }
    }
}

#[cfg(test)]
impl Endpoints {
    /// Same endpoints for web, API and probe; used against a mock server
    pub fn single_host(base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        let probe_host = format!(
            "{}:{}",
            base.host_str().unwrap_or("localhost"),
            base.port_or_known_default().unwrap_or(80)
        );
        Ok(Endpoints {
            web: base.clone(),
            api: base,
            probe_host,
        })
    }
}

/// How the output is nested under the output directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RootDirectory {
    /// Write straight into the output directory
    Omit,
    /// Nest under a directory named after the repository
    #[default]
    RepoName,
    /// Nest under a caller-chosen directory
    Named(String),
}

impl FromStr for RootDirectory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" => Err("root directory name must not be empty".to_string()),
            "false" => Ok(RootDirectory::Omit),
            "true" => Ok(RootDirectory::RepoName),
            name => Ok(RootDirectory::Named(name.to_string())),
        }
    }
}

/// Output-shaping overrides that feed into resolution
#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    pub file_name: Option<String>,
    pub root_directory: RootDirectory,
}

/// Everything we know about the requested repository and where it goes.
/// Built once per run and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Decoded path below the repository root; empty for the whole repo
    pub sub_path: String,
    /// Last segment of sub_path, or the repo name
    pub root_name: String,
    pub download_file_name: String,
    /// Empty when nesting is omitted
    pub root_directory_name: String,
    /// `<api>/repos/<owner>/<repo>/contents/`
    pub api_url_prefix: String,
    /// `?ref=<branch>`, form-encoded
    pub api_url_postfix: String,
    pub archive_url: String,
}

/// Parses a repository URL into a descriptor
pub fn resolve(
    url: &str,
    layout: &LayoutOptions,
    endpoints: &Endpoints,
) -> Result<RepositoryDescriptor, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let trimmed = url.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(invalid("no URL given".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !same_host(&parsed, &endpoints.web) {
        return Err(invalid(format!(
            "expected a {} URL",
            endpoints.web.host_str().unwrap_or("GitHub")
        )));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    // segments: [owner, repo, "tree"|"blob", branch, sub/path...]
    let owner = segments.first().copied().unwrap_or_default();
    let repo = segments.get(1).copied().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid("expected <owner>/<repo> in the path".to_string()));
    }

    let branch = match segments.get(3) {
        Some(branch) if !branch.is_empty() => decode(branch).map_err(invalid)?,
        _ => DEFAULT_BRANCH.to_string(),
    };

    let raw_sub_path = segments
        .get(4..)
        .unwrap_or_default()
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    let sub_path = decode(&raw_sub_path).map_err(invalid)?;

    let root_name = sub_path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(repo)
        .to_string();

    let download_file_name = layout
        .file_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| root_name.clone());

    let root_directory_name = match &layout.root_directory {
        RootDirectory::Omit => String::new(),
        RootDirectory::RepoName => repo.to_string(),
        RootDirectory::Named(name) => name.clone(),
    };

    let api_base = endpoints.api.as_str().trim_end_matches('/');
    let web_base = endpoints.web.as_str().trim_end_matches('/');

    Ok(RepositoryDescriptor {
        owner: owner.to_string(),
        repo: repo.to_string(),
        api_url_prefix: format!("{}/repos/{}/{}/contents/", api_base, owner, repo),
        api_url_postfix: format!(
            "?{}",
            form_urlencoded::Serializer::new(String::new())
                .append_pair("ref", &branch)
                .finish()
        ),
        archive_url: format!("{}/{}/{}/archive/{}.zip", web_base, owner, repo, branch),
        branch,
        sub_path,
        root_name,
        download_file_name,
        root_directory_name,
    })
}

// Scheme and default ports are ignored; the port only has to match when the
// expected endpoint names one explicitly (e.g. a local server)
fn same_host(candidate: &Url, expected: &Url) -> bool {
    let host = |url: &Url| {
        url.host_str()
            .map(|host| host.trim_start_matches("www.").to_ascii_lowercase())
    };
    let port_matches = match expected.port() {
        Some(port) => candidate.port_or_known_default() == Some(port),
        None => true,
    };
    host(candidate).is_some() && host(candidate) == host(expected) && port_matches
}

fn decode(raw: &str) -> Result<String, String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("path is not valid UTF-8: {}", e))
}

impl RepositoryDescriptor {
    /// True when the URL named no sub-path (the whole repository)
    pub fn is_repository_root(&self) -> bool {
        self.sub_path.is_empty()
    }

    /// Contents API URL listing `remote_path` on this descriptor's branch
    pub fn listing_url(&self, remote_path: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.api_url_prefix).map_err(|e| FetchError::InvalidUrl {
            url: self.api_url_prefix.clone(),
            reason: e.to_string(),
        })?;

        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(remote_path.split('/').filter(|segment| !segment.is_empty()));
        }
        url.set_query(Some(self.api_url_postfix.trim_start_matches('?')));
        Ok(url)
    }

    /// `<out>/<root directory>`, or just `<out>` when nesting is omitted
    pub fn output_root(&self, out: &Path) -> PathBuf {
        if self.root_directory_name.is_empty() {
            out.to_path_buf()
        } else {
            out.join(&self.root_directory_name)
        }
    }

    /// Local path of the directory (or single file) this run produces
    pub fn target_path(&self, out: &Path) -> PathBuf {
        self.output_root(out).join(&self.download_file_name)
    }

    /// Local path of the zip written in archive mode
    pub fn archive_path(&self, out: &Path) -> PathBuf {
        self.output_root(out)
            .join(format!("{}.zip", self.download_file_name))
    }
}
