// src/github/auth.rs
// =============================================================================
// Decides whether a request carries credentials.
//
// Anonymous GitHub API calls are rate limited hard (60 per hour), so a
// credential helps, but we only spend it when we must:
//
//   NoAuth            no credential supplied
//   ConfiguredUnused  credential supplied, requests go out anonymously
//   Active            every request carries the credential
//
// ConfiguredUnused becomes Active the first time GitHub answers 403, and
// the request that got the 403 is retried once. With --always-use-auth we
// start in Active. Active never goes back.
//
// Rust concepts:
// - Enums as state machines: the compiler checks every state is handled
// - &mut self: only the owner of the manager can change its state
// =============================================================================

use std::fmt;
use std::str::FromStr;

/// username:secret pair for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

// Keep the secret out of logs and panics
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromStr for Credential {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (username, secret) = value
            .split_once(':')
            .ok_or_else(|| "auth must look like <username>:<token>".to_string())?;
        if username.is_empty() || secret.is_empty() {
            return Err("auth username and token must both be non-empty".to_string());
        }
        Ok(Credential {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoAuth,
    ConfiguredUnused,
    Active,
}

/// What to do after a 403
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Credentials were just switched on: send the same request again
    Retry,
    /// Nothing left to try; `authenticated` says whether credentials were in use
    Exhausted { authenticated: bool },
}

#[derive(Debug)]
pub struct AuthManager {
    credential: Option<Credential>,
    state: AuthState,
}

impl AuthManager {
    pub fn new(credential: Option<Credential>, always_use: bool) -> Self {
        let state = match (&credential, always_use) {
            (None, _) => AuthState::NoAuth,
            (Some(_), true) => AuthState::Active,
            (Some(_), false) => AuthState::ConfiguredUnused,
        };
        AuthManager { credential, state }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// The credential to attach to the next request, if any
    pub fn credential_for_request(&self) -> Option<&Credential> {
        match self.state {
            AuthState::Active => self.credential.as_ref(),
            AuthState::NoAuth | AuthState::ConfiguredUnused => None,
        }
    }

    /// Called once per 403 response
    pub fn on_forbidden(&mut self) -> Escalation {
        match self.state {
            AuthState::ConfiguredUnused => {
                self.state = AuthState::Active;
                tracing::info!("rate limited anonymously, switching to authenticated requests");
                Escalation::Retry
            }
            AuthState::NoAuth => Escalation::Exhausted {
                authenticated: false,
            },
            AuthState::Active => Escalation::Exhausted {
                authenticated: true,
            },
        }
    }
}
