//! What a caller can put in a run: the configuration and the optional
//! pass-through fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{self, Config};
use crate::error::ConfigurationError;

/// The `type` field: which output the service should produce.
///
/// Only `Cfg` and `Ret` change how the reply is parsed; the rest come back
/// as spectra or raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// Radiance spectrum.
    Rad,
    /// Noise spectrum.
    Noi,
    /// Transmittance.
    Trn,
    /// Atmosphere profile.
    Atm,
    /// Layer-by-layer output.
    Lyr,
    /// Surface reflectance.
    Srf,
    /// Summary of derived parameters.
    Str,
    /// Telluric transmittance.
    Tel,
    /// Everything, as a multi-file archive listing.
    All,
    /// Echo of the resolved configuration.
    Cfg,
    /// Retrieval results, as a multi-section text.
    Ret,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Rad => "rad",
            OutputType::Noi => "noi",
            OutputType::Trn => "trn",
            OutputType::Atm => "atm",
            OutputType::Lyr => "lyr",
            OutputType::Srf => "srf",
            OutputType::Str => "str",
            OutputType::Tel => "tel",
            OutputType::All => "all",
            OutputType::Cfg => "cfg",
            OutputType::Ret => "ret",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let output = match s {
            "rad" => OutputType::Rad,
            "noi" => OutputType::Noi,
            "trn" => OutputType::Trn,
            "atm" => OutputType::Atm,
            "lyr" => OutputType::Lyr,
            "srf" => OutputType::Srf,
            "str" => OutputType::Str,
            "tel" => OutputType::Tel,
            "all" => OutputType::All,
            "cfg" => OutputType::Cfg,
            "ret" => OutputType::Ret,
            other => {
                return Err(ConfigurationError::InvalidSetting {
                    name: "type".to_string(),
                    value: other.to_string(),
                })
            }
        };
        Ok(output)
    }
}

/// Optional form fields sent alongside the configuration text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Passed through as `watm`.
    pub watm: Option<String>,
    /// Passed through as `type`.
    pub output: Option<OutputType>,
}

impl RunOptions {
    pub fn output(mut self, output: OutputType) -> Self {
        self.output = Some(output);
        self
    }

    pub fn watm(mut self, watm: impl Into<String>) -> Self {
        self.watm = Some(watm.into());
        self
    }
}

/// A run: a configuration mapping or literal text, plus options.
///
/// When both are set the literal text is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRequest {
    pub config: Option<Config>,
    pub config_text: Option<String>,
    pub options: RunOptions,
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_text(mut self, text: impl Into<String>) -> Self {
        self.config_text = Some(text.into());
        self
    }

    pub fn output(mut self, output: OutputType) -> Self {
        self.options.output = Some(output);
        self
    }

    pub fn watm(mut self, watm: impl Into<String>) -> Self {
        self.options.watm = Some(watm.into());
        self
    }

    /// The text that goes into the `file` field.
    pub fn resolve_text(&self) -> Result<String, ConfigurationError> {
        match (&self.config_text, &self.config) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(config)) => Ok(config::encode(config)),
            (None, None) => Err(ConfigurationError::MissingConfig),
        }
    }
}
