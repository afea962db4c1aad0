// ⚙️ Configuration - engine tuning and process settings
//
// Precedence: CLI flags > environment (.env included) > defaults.

use crate::error::EngineError;
use crate::metrics::DEFAULT_BOTTLENECK_FACTOR;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Knobs that change analytics results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A move is a bottleneck when its duration exceeds factor × mean
    pub bottleneck_factor: f64,
}

impl EngineConfig {
    pub fn new(bottleneck_factor: f64) -> Result<Self, EngineError> {
        let config = EngineConfig { bottleneck_factor };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.bottleneck_factor.is_finite() || self.bottleneck_factor <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "bottleneck factor must be a positive number, got {}",
                self.bottleneck_factor
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            bottleneck_factor: DEFAULT_BOTTLENECK_FACTOR,
        }
    }
}

/// Process configuration shared by the CLI and the API server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding transactions.csv, batches.csv, logistics.csv
    pub data_dir: Option<PathBuf>,
    pub engine: EngineConfig,
    pub port: u16,
    pub bind: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bottleneck_factor = match present("AQUACHAIN_BOTTLENECK_FACTOR") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("AQUACHAIN_BOTTLENECK_FACTOR is not a number: {}", raw))?,
            None => DEFAULT_BOTTLENECK_FACTOR,
        };

        let port = match present("AQUACHAIN_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("AQUACHAIN_PORT is not a valid port: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            data_dir: present("AQUACHAIN_DATA_DIR").map(PathBuf::from),
            engine: EngineConfig::new(bottleneck_factor)?,
            port,
            bind: present("AQUACHAIN_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }

    /// Builder pattern: override the data directory (CLI flag)
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.data_dir = dir;
        }
        self
    }

    /// Builder pattern: override the bottleneck factor (CLI flag)
    pub fn with_bottleneck_factor(mut self, factor: Option<f64>) -> Result<Self, EngineError> {
        if let Some(factor) = factor {
            self.engine = EngineConfig::new(factor)?;
        }
        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            engine: EngineConfig::default(),
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}
