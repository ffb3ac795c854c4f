// src/config.rs
// =============================================================================
// Loads the JSON config file and merges it with the command line.
//
// The file lives at ~/.repo-fetch.json unless --config says otherwise:
//
//   {
//     "auth": "octocat:ghp_xxx",
//     "alwaysUseAuth": false,
//     "timeout": 30000
//   }
//
// Every key is optional. A flag given on the command line wins over the
// same key in the file. A missing file at the default location is fine;
// a missing file that was asked for with --config is an error.
// =============================================================================

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::FetchError;
use crate::fetch::FetchOptions;
use crate::github::{Credential, LayoutOptions};

pub const CONFIG_FILE_NAME: &str = ".repo-fetch.json";

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub auth: Option<String>,
    pub always_use_auth: Option<bool>,
    pub timeout: Option<u64>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Reads the config file; `explicit` is the --config value
pub fn load(explicit: Option<&Path>) -> Result<ConfigFile, FetchError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(ConfigFile::default()),
        },
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(ConfigFile::default());
        }
        Err(e) => {
            return Err(FetchError::Config(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };

    tracing::debug!(path = %path.display(), "loaded config file");
    serde_json::from_str(&text)
        .map_err(|e| FetchError::Config(format!("invalid {}: {}", path.display(), e)))
}

/// Builds the options handed to the core
pub fn merge(cli: &Cli, file: ConfigFile) -> Result<FetchOptions, FetchError> {
    let credential = match (&cli.auth, file.auth) {
        (Some(credential), _) => Some(credential.clone()),
        (None, Some(auth)) => Some(
            auth.parse::<Credential>()
                .map_err(|e| FetchError::Config(format!("auth: {}", e)))?,
        ),
        (None, None) => None,
    };

    let always_use_auth = cli.always_use_auth || file.always_use_auth.unwrap_or(false);
    if always_use_auth && credential.is_none() {
        tracing::warn!("always-use-auth is set but no credentials were given");
    }

    Ok(FetchOptions {
        url: cli.url.clone(),
        out: cli.out.clone(),
        credential,
        always_use_auth,
        timeout: cli.timeout.or(file.timeout).map(Duration::from_millis),
        layout: LayoutOptions {
            file_name: cli.file_name.clone(),
            root_directory: cli.root_directory.clone().unwrap_or_default(),
        },
        no_archive: cli.no_archive,
    })
}
