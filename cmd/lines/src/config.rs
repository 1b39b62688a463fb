//! Configuration file for `sluice-lines`.
//!
//! The file is YAML. Bucket tunables sit at the top level next to the
//! line-reading defaults; every key is optional:
//!
//! ```yaml
//! file_buffer_size: 65536
//! max_line_length: 4096
//! eol: crlf
//! ```

use std::path::Path;

use anyhow::Context as _;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sluice_bucket::{BucketConfig, EolSet};

/// Which line terminators end a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EolMode {
    /// `\n`
    #[default]
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    Crlf,
    /// Any of the three.
    Any,
    /// No terminator; lines are cut at the maximum length only.
    None,
}

impl From<EolMode> for EolSet {
    fn from(mode: EolMode) -> Self {
        match mode {
            EolMode::Lf => EolSet::LF,
            EolMode::Cr => EolSet::CR,
            EolMode::Crlf => EolSet::CRLF,
            EolMode::Any => EolSet::ANY,
            EolMode::None => EolSet::NONE,
        }
    }
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub bucket: BucketConfig,

    /// Terminators used when `--eol` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eol: Option<EolMode>,
}

impl Config {
    /// Parses YAML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, all-default config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.bucket.validate()?;
        Ok(config)
    }
}

/// Loads the config at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("parse config {}", path.display()))
}
