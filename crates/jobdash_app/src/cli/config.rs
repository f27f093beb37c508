//! `jobdash.ron` plus environment overrides.
//!
//! Precedence, lowest first: built-in defaults, the config file,
//! `JOBDASH_BASE_URL` / `JOBDASH_TOKEN`, command-line flags.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use jobdash_client::{ClientSettings, RouteStyle};
use jobdash_logging::jobdash_info;
use serde::{Deserialize, Serialize};

pub const ENV_BASE_URL: &str = "JOBDASH_BASE_URL";
pub const ENV_TOKEN: &str = "JOBDASH_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub route_style: Option<RouteStyle>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub postings_limit: Option<u32>,
    /// Where `.jobdash_state.ron` lives. Defaults to the working directory.
    pub state_dir: Option<PathBuf>,
}

impl AppConfig {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        let config = ron::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        jobdash_info!("loaded config from {:?}", path);
        Ok(config)
    }

    /// Applies `JOBDASH_*` variables; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(token) = non_empty(ENV_TOKEN) {
            self.auth_token = Some(token);
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            base_url: self.base_url.clone().unwrap_or(defaults.base_url),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            auth_token: self.auth_token.clone().or(defaults.auth_token),
            route_style: self.route_style.unwrap_or(defaults.route_style),
            postings_limit: self.postings_limit.unwrap_or(defaults.postings_limit),
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
