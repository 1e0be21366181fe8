//! A connected PSG session: settings, default configuration, and the
//! blocking `submit`/`run` calls.
//!
//! # Design
//! `Psg` pairs the stateless `PsgClient` with a `Transport`. Everything it
//! holds is fixed at construction. `connect` refuses to hand out a session
//! until the default configuration has been sent once and answered with a
//! 200, so a bad URL or key fails at startup rather than on first use.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::PsgClient;
use crate::config::{self, Config, DEFAULT_CONFIG};
use crate::error::{ConfigurationError, PsgError};
use crate::reply::{self, Reply};
use crate::request::{RunOptions, RunRequest};
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_SERVER_URL: &str = "https://psg.gsfc.nasa.gov/api.php";

const ENV_SERVER_URL: &str = "PSG_SERVER_URL";
const ENV_TIMEOUT_SECONDS: &str = "PSG_TIMEOUT_SECONDS";
const ENV_API_KEY: &str = "PSG_API_KEY";
const ENV_DEFAULT_CONFIG: &str = "PSG_DEFAULT_CONFIG";

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
const fn default_timeout_seconds() -> f64 {
    10.0
}

/// Where the default configuration comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultConfig {
    /// The configuration shipped with this crate.
    #[default]
    Bundled,
    /// A file on disk; the path must be absolute.
    File(PathBuf),
}

impl DefaultConfig {
    /// Read the configuration text.
    pub fn load(&self) -> Result<String, PsgError> {
        match self {
            DefaultConfig::Bundled => Ok(DEFAULT_CONFIG.to_string()),
            DefaultConfig::File(path) => {
                if !path.is_absolute() {
                    return Err(ConfigurationError::RelativeDefaultConfigPath(path.clone()).into());
                }
                std::fs::read_to_string(path).map_err(|source| PsgError::DefaultConfig {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Connection settings, fixed for the lifetime of a `Psg`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub default_config: DefaultConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_seconds: default_timeout_seconds(),
            api_key: None,
            default_config: DefaultConfig::Bundled,
        }
    }
}

impl Settings {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn default_config(mut self, default_config: DefaultConfig) -> Self {
        self.default_config = default_config;
        self
    }

    /// Defaults overridden by `PSG_SERVER_URL`, `PSG_TIMEOUT_SECONDS`,
    /// `PSG_API_KEY` and `PSG_DEFAULT_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let mut settings = Self::default();
        if let Some(url) = lookup(ENV_SERVER_URL) {
            settings.server_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECONDS) {
            settings.timeout_seconds =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigurationError::InvalidSetting {
                        name: ENV_TIMEOUT_SECONDS.to_string(),
                        value: raw.clone(),
                    })?;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.is_empty()) {
            settings.api_key = Some(key);
        }
        if let Some(path) = lookup(ENV_DEFAULT_CONFIG) {
            settings.default_config = DefaultConfig::File(PathBuf::from(path));
        }
        settings.timeout()?;
        Ok(settings)
    }

    /// The request timeout. Must be positive and finite.
    pub fn timeout(&self) -> Result<Duration, ConfigurationError> {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| ConfigurationError::InvalidSetting {
                name: "timeout_seconds".to_string(),
                value: self.timeout_seconds.to_string(),
            })
    }
}

/// The body of a 200 reply and how long the round-trip took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub text: String,
    pub duration: Duration,
}

/// A session with a PSG server whose connectivity has been checked.
pub struct Psg<T: Transport = UreqTransport> {
    client: PsgClient,
    transport: T,
    settings: Settings,
    default_config: Config,
    default_config_text: String,
}

impl Psg<UreqTransport> {
    /// Connect over HTTP. Sends the default configuration once and fails if
    /// that does not succeed.
    pub fn connect(settings: Settings) -> Result<Self, PsgError> {
        let transport = UreqTransport::new(settings.timeout()?);
        Self::with_transport(settings, transport)
    }
}

impl<T: Transport> Psg<T> {
    /// Like `connect`, over any transport.
    pub fn with_transport(settings: Settings, transport: T) -> Result<Self, PsgError> {
        settings.timeout()?;
        let default_config_text = settings.default_config.load()?;
        let default_config = config::decode(&default_config_text);
        let psg = Self {
            client: PsgClient::new(&settings.server_url, settings.api_key.as_deref()),
            transport,
            settings,
            default_config,
            default_config_text,
        };

        info!(server_url = %psg.settings.server_url, "testing connection to PSG");
        psg.run(&RunRequest::new().config(psg.default_config.clone()))?;
        info!(server_url = %psg.settings.server_url, "connected to PSG");
        Ok(psg)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The decoded default configuration; a starting point for new runs.
    pub fn default_config(&self) -> &Config {
        &self.default_config
    }

    pub fn default_config_text(&self) -> &str {
        &self.default_config_text
    }

    /// POST configuration text and return the body of a 200 reply.
    pub fn submit(&self, config_text: &str, options: &RunOptions) -> Result<RawReply, PsgError> {
        let request = self.client.build_submit(config_text, options);
        debug!(
            url = %request.url,
            fields = request.form.len(),
            output = ?options.output,
            "submitting configuration"
        );

        let started = Instant::now();
        let response = self.transport.execute(&request)?;
        let duration = started.elapsed();
        let text = self.client.parse_submit(response)?;
        debug!(?duration, bytes = text.len(), "received reply");

        Ok(RawReply { text, duration })
    }

    /// Submit a run and classify the reply.
    pub fn run(&self, request: &RunRequest) -> Result<Reply, PsgError> {
        let text = request.resolve_text()?;
        let raw = self.submit(&text, &request.options)?;
        Ok(reply::classify(&raw.text, request.options.output, raw.duration))
    }
}
