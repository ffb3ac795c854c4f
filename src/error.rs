// src/error.rs
// =============================================================================
// This module defines every way a fetch can fail.
//
// Each variant maps to one failure kind the user can see:
// - InvalidUrl: the URL is not a GitHub repository URL we understand
// - BadCredentials: GitHub answered 401
// - RateLimitExceeded: GitHub answered 403 and we have no usable credential
// - NotFound: GitHub answered 404
// - ConnectivityLost: the network stayed down longer than the grace period
// - Transfer: any other HTTP or network failure
//
// A 403 while credentials are configured but unused is NOT an error here:
// the auth manager turns it into a single retry (see github/auth.rs).
//
// Rust concepts:
// - thiserror: derives Display and Error for us from #[error("...")]
// - #[from]: lets the ? operator convert io::Error into FetchError
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Hint appended to 404 messages
pub const NOT_FOUND_HINT: &str = "check that the URL, branch and path are correct";

#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is missing, not on the expected host, or too short
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 401 from GitHub
    #[error("bad credentials: GitHub rejected the supplied username/token")]
    BadCredentials,

    /// 403 with no credential to escalate to (or credentials already in use)
    #[error("GitHub API rate limit exceeded; {}", rate_limit_advice(.authenticated))]
    RateLimitExceeded { authenticated: bool },

    /// 404 from GitHub
    #[error("not found: {url} ({})", NOT_FOUND_HINT)]
    NotFound { url: String },

    /// The connectivity monitor gave up waiting for the network
    #[error("lost network connectivity for longer than {grace_ms}ms")]
    ConnectivityLost { grace_ms: u64 },

    /// Any other non-2xx response or network failure
    #[error("transfer failed for {url}: {message}")]
    Transfer { url: String, message: String },

    /// Local filesystem failure while writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed
    #[error("config error: {0}")]
    Config(String),
}

fn rate_limit_advice(authenticated: &bool) -> &'static str {
    if *authenticated {
        "the supplied credentials are rate limited too, try again later"
    } else {
        "pass --auth <username:token> to raise the limit"
    }
}

impl FetchError {
    /// Builds the error for a failed (non-2xx) response that is not one of
    /// the auth-related statuses.
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => FetchError::BadCredentials,
            StatusCode::NOT_FOUND => FetchError::NotFound {
                url: url.to_string(),
            },
            other => FetchError::Transfer {
                url: url.to_string(),
                message: format!("HTTP {}", other.as_u16()),
            },
        }
    }

    /// Network-level failure (DNS, connection reset, TLS, body read)
    pub fn network(url: &str, error: reqwest::Error) -> Self {
        FetchError::Transfer {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    /// Whether the failure can happen after output has begun, so a rollback
    /// must be attempted before exiting
    pub fn needs_rollback(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl { .. } | FetchError::Config(_))
    }
}
