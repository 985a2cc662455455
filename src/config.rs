//! Server configuration for binaries built on pigweb.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. a TOML file passed to [`ServerConfig::load`]
//! 3. environment variables (`PIGWEB_ADDR`, `PIGWEB_STACK_SIZE`, `PIGWEB_LOG_LEVEL`)
//! 4. command line flags, applied by the binary itself
//!
//! ```toml
//! addr = "0.0.0.0:8080"
//! stack_size = "0x8000"   # or 32768
//! log_level = "debug"
//! ```
//!
//! The coroutine stack size accepts decimal or `0x` hexadecimal. Every
//! in-flight request holds one coroutine stack, so total memory grows with
//! `stack_size × concurrency`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub addr: String,
    /// Coroutine stack size in bytes.
    #[serde(deserialize_with = "deserialize_stack_size")]
    pub stack_size: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, then `path` if given, then the environment.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::load`] and [`ServerConfig::apply_env`].
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `PIGWEB_*` environment variables.
    ///
    /// # Errors
    ///
    /// `PIGWEB_STACK_SIZE` is set but not a number.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_lookup(|key| env::var(key).ok())
    }

    /// [`ServerConfig::apply_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// `PIGWEB_STACK_SIZE` is set but not a number.
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("PIGWEB_ADDR") {
            self.addr = addr;
        }
        if let Some(raw) = lookup("PIGWEB_STACK_SIZE") {
            self.stack_size = parse_stack_size(&raw).context("Invalid PIGWEB_STACK_SIZE")?;
        }
        if let Some(level) = lookup("PIGWEB_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }
}

/// Parse `16384` or `0x4000`.
///
/// # Errors
///
/// Not a number, or zero.
pub fn parse_stack_size(raw: &str) -> Result<usize> {
    let raw = raw.trim();
    let size = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => raw.parse(),
    }
    .with_context(|| format!("stack size {raw:?} is not a decimal or 0x-hex number"))?;
    if size == 0 {
        bail!("stack size must be greater than zero");
    }
    Ok(size)
}

fn deserialize_stack_size<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(0) => Err(serde::de::Error::custom("stack size must be greater than zero")),
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s).map_err(serde::de::Error::custom),
    }
}
