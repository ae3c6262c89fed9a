//! `cassis.toml` loading

use anyhow::{bail, Context, Result};
use cassis_transform::LiftOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cassis.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub lift: LiftOptions,
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid configuration")
    }

    /// Read `explicit` if given, else `cassis.toml` next to `input`.
    ///
    /// A missing implicit file yields the defaults; a missing explicit one is an error.
    pub fn load(explicit: Option<&Path>, input: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("configuration file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let candidate = search_root(input).join(CONFIG_FILE);
                if !candidate.is_file() {
                    log::debug!("no {} found, using defaults", candidate.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&source).with_context(|| format!("in {}", path.display()))?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

fn search_root(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
