//! Harness configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::runner::RunnerConfig;
use crate::server::ServerConfig;
use crate::wait::DelayTiers;

/// Which implementation of the application the scenarios drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process playground backed by SQLite
    #[default]
    Headless,
    /// The real application in a Playwright-driven browser
    Browser,
}

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub backend: Backend,

    /// Where `test-results.json` goes
    pub output_dir: PathBuf,

    /// Settlement wait tiers
    pub delays: DelayTiers,

    /// Application under test
    pub app: AppConfig,

    /// Browser backend settings
    pub browser: PlaywrightConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Headless,
            output_dir: PathBuf::from("test-results"),
            delays: DelayTiers::default(),
            app: AppConfig::default(),
            browser: PlaywrightConfig::default(),
        }
    }
}

/// Location of the application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory served to the browser
    pub root: PathBuf,

    /// Entry document, relative to `root`
    pub entry: String,

    /// How long the static server gets to answer
    pub startup_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: "index.html".to_string(),
            startup_timeout_ms: 10_000,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| E2eError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.app.entry.trim().is_empty() {
            return Err(E2eError::Config("app.entry must not be empty".to_string()));
        }
        let DelayTiers {
            short_ms,
            medium_ms,
            long_ms,
        } = self.delays;
        if short_ms == 0 || short_ms > medium_ms || medium_ms > long_ms {
            return Err(E2eError::Config(format!(
                "delays must satisfy 0 < short <= medium <= long (got {}, {}, {})",
                short_ms, medium_ms, long_ms
            )));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            delays: self.delays,
            entry: self.app.entry.clone(),
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            root: self.app.root.clone(),
            entry: self.app.entry.clone(),
            port: None,
            startup_timeout: Duration::from_millis(self.app.startup_timeout_ms),
        }
    }
}
