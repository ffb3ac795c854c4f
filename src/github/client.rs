// src/github/client.rs
// =============================================================================
// Every request to GitHub goes through ApiClient::get.
//
// For each request it:
// 1. Checks the abort signal from the connectivity monitor
// 2. Asks the AuthManager whether to attach credentials
// 3. Sends the request
// 4. On 403, lets the AuthManager escalate and retries exactly once
// 5. Turns any other non-2xx status into a FetchError
//
// The retried request is never escalated again, so bad credentials cannot
// loop forever.
//
// Rust concepts:
// - reqwest::Client: Reused for every request (connection pooling)
// - &mut self: get() may change the auth state, so it needs unique access
// =============================================================================

use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::auth::{AuthManager, Escalation};
use super::contents::Listing;
use crate::error::FetchError;
use crate::monitor::AbortSignal;

/// User agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!("repo-fetch/", env!("CARGO_PKG_VERSION"));

pub struct ApiClient {
    http: Client,
    auth: AuthManager,
    abort: AbortSignal,
}

impl ApiClient {
    pub fn new(auth: AuthManager, abort: AbortSignal) -> Result<Self, FetchError> {
        // No request timeout: the connectivity monitor owns that concern
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transfer {
                url: String::new(),
                message: format!("could not build HTTP client: {}", e),
            })?;

        Ok(ApiClient { http, auth, abort })
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// GET `url`, escalating to authenticated requests on the first 403
    pub async fn get(&mut self, url: &str) -> Result<Response, FetchError> {
        self.abort.check()?;
        tracing::debug!(url, "GET");

        let response = self.send(url).await?;
        if response.status() != StatusCode::FORBIDDEN {
            return self.check_status(response, url);
        }

        match self.auth.on_forbidden() {
            Escalation::Retry => {
                self.abort.check()?;
                tracing::debug!(url, "retrying with credentials");
                let retried = self.send(url).await?;
                self.check_status(retried, url)
            }
            Escalation::Exhausted { authenticated } => {
                Err(FetchError::RateLimitExceeded { authenticated })
            }
        }
    }

    /// Lists a path through the contents API
    pub async fn list(&mut self, url: &Url) -> Result<Listing, FetchError> {
        let response = self.get(url.as_str()).await?;
        response
            .json::<Listing>()
            .await
            .map_err(|e| FetchError::Transfer {
                url: url.to_string(),
                message: format!("unexpected contents API response: {}", e),
            })
    }

    async fn send(&self, url: &str) -> Result<Response, FetchError> {
        let mut request = self.http.get(url);
        if let Some(credential) = self.auth.credential_for_request() {
            request = request.basic_auth(&credential.username, Some(&credential.secret));
        }
        request
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    // Final word on a response; a 403 here is not escalated again
    fn check_status(&self, response: Response, url: &str) -> Result<Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::FORBIDDEN {
            Err(FetchError::RateLimitExceeded {
                authenticated: self.auth.credential_for_request().is_some(),
            })
        } else {
            Err(FetchError::from_status(status, url))
        }
    }
}
